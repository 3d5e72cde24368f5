use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// One 3-digit CLAE sector with its parents and 6-digit sub-classes.
struct Sector {
    clae3: u32,
    clae3_desc: &'static str,
    clae2: u32,
    clae2_desc: &'static str,
    letra: &'static str,
    letra_desc: &'static str,
    /// Median wage in January 2007.
    base_wage: f64,
    subclasses: &'static [(u32, &'static str)],
}

const AGRO: &str = "AGRICULTURA, GANADERIA, CAZA Y SILVICULTURA";
const INDUSTRIA: &str = "INDUSTRIA MANUFACTURERA";

const SECTORS: &[Sector] = &[
    Sector {
        clae3: 11,
        clae3_desc: "Cultivos temporales",
        clae2: 1,
        clae2_desc: "Agricultura y ganaderia",
        letra: "A",
        letra_desc: AGRO,
        base_wage: 2_400.0,
        subclasses: &[(11111, "Cultivo de arroz"), (11112, "Cultivo de trigo")],
    },
    Sector {
        clae3: 14,
        clae3_desc: "Cria de animales",
        clae2: 1,
        clae2_desc: "Agricultura y ganaderia",
        letra: "A",
        letra_desc: AGRO,
        base_wage: 2_600.0,
        subclasses: &[(14113, "Cria de ganado bovino")],
    },
    Sector {
        clae3: 61,
        clae3_desc: "Extraccion de petroleo crudo",
        clae2: 6,
        clae2_desc: "Extraccion de petroleo y gas",
        letra: "B",
        letra_desc: "PESCA Y MINERIA",
        base_wage: 9_800.0,
        subclasses: &[(61000, "Extraccion de petroleo crudo")],
    },
    Sector {
        clae3: 101,
        clae3_desc: "Procesamiento de carne",
        clae2: 10,
        clae2_desc: "Alimentos",
        letra: "C",
        letra_desc: INDUSTRIA,
        base_wage: 3_900.0,
        subclasses: &[
            (101011, "Matanza de ganado bovino"),
            (101012, "Procesamiento de carne de aves"),
        ],
    },
    Sector {
        clae3: 191,
        clae3_desc: "Productos de hornos de coque",
        clae2: 19,
        clae2_desc: "Refinacion de petroleo",
        letra: "C",
        letra_desc: INDUSTRIA,
        base_wage: 8_700.0,
        subclasses: &[(191000, "Fabricacion de productos de hornos de coque")],
    },
    Sector {
        clae3: 351,
        clae3_desc: "Generacion de energia electrica",
        clae2: 35,
        clae2_desc: "Electricidad",
        letra: "D",
        letra_desc: "ELECTRICIDAD, GAS Y AGUA",
        base_wage: 7_600.0,
        subclasses: &[
            (351110, "Generacion de energia termica"),
            (351120, "Generacion de energia nuclear"),
        ],
    },
    Sector {
        clae3: 471,
        clae3_desc: "Venta al por menor en comercios no especializados",
        clae2: 47,
        clae2_desc: "Comercio al por menor",
        letra: "G",
        letra_desc: "COMERCIO",
        base_wage: 3_100.0,
        subclasses: &[(471110, "Venta en hipermercados")],
    },
    Sector {
        clae3: 641,
        clae3_desc: "Intermediacion monetaria",
        clae2: 64,
        clae2_desc: "Servicios financieros",
        letra: "K",
        letra_desc: "INTERMEDIACION FINANCIERA",
        base_wage: 8_200.0,
        subclasses: &[
            (641100, "Servicios de la banca central"),
            (641910, "Servicios de la banca mayorista"),
        ],
    },
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_classification(path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "clae6", "clae6_desc", "clae3", "clae3_desc", "clae2", "clae2_desc", "letra", "letra_desc",
    ])?;
    for sector in SECTORS {
        for &(clae6, desc6) in sector.subclasses {
            writer.write_record([
                clae6.to_string().as_str(),
                desc6,
                sector.clae3.to_string().as_str(),
                sector.clae3_desc,
                sector.clae2.to_string().as_str(),
                sector.clae2_desc,
                sector.letra,
                sector.letra_desc,
            ])?;
        }
    }
    writer.flush().with_context(|| format!("writing {path}"))?;
    Ok(())
}

struct WageRows {
    fecha: Vec<String>,
    clae3: Vec<i64>,
    w_median: Vec<f64>,
}

/// Monthly series 2007-01..2022-12 with compounding nominal growth and noise.
fn generate_wages(rng: &mut SimpleRng) -> WageRows {
    let mut rows = WageRows {
        fecha: Vec::new(),
        clae3: Vec::new(),
        w_median: Vec::new(),
    };
    for year in 2007..=2022 {
        for month in 1..=12 {
            let t = ((year - 2007) * 12 + (month - 1)) as f64;
            let inflation = 1.022_f64.powf(t);
            for sector in SECTORS {
                let wage = sector.base_wage * inflation * (1.0 + rng.gauss(0.0, 0.02));
                rows.fecha.push(format!("{year}-{month:02}-01"));
                rows.clae3.push(sector.clae3 as i64);
                rows.w_median.push((wage.max(0.0) * 100.0).round() / 100.0);
            }
        }
    }
    rows
}

fn write_wages_csv(path: &str, rows: &WageRows) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["fecha", "clae3", "w_median"])?;
    for i in 0..rows.fecha.len() {
        writer.write_record([
            rows.fecha[i].clone(),
            rows.clae3[i].to_string(),
            rows.w_median[i].to_string(),
        ])?;
    }
    writer.flush().with_context(|| format!("writing {path}"))?;
    Ok(())
}

fn write_wages_parquet(path: &str, rows: &WageRows) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("fecha", DataType::Utf8, false),
        Field::new("clae3", DataType::Int64, false),
        Field::new("w_median", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.fecha.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(rows.clae3.clone())),
            Arc::new(Float64Array::from(rows.w_median.clone())),
        ],
    )
    .context("building wage record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing wage batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    write_classification("Clases.csv")?;
    let wages = generate_wages(&mut rng);
    write_wages_csv("Mensuales.csv", &wages)?;
    write_wages_parquet("Mensuales.parquet", &wages)?;

    log::info!(
        "Wrote {} sectors to Clases.csv and {} wage rows to Mensuales.csv / Mensuales.parquet",
        SECTORS.len(),
        wages.fecha.len()
    );
    Ok(())
}
