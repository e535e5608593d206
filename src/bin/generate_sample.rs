use std::path::Path;

use anyhow::{Context, Result};

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize
    }
}

const SUBCLASSES: [&str; 6] = [
    "Fatty Acyls",
    "Glycerophospholipids",
    "Amino Acids",
    "Carbohydrates",
    "Steroids",
    "Nucleotides",
];

const METABOLITES: usize = 60;
const CORRELATIONS: usize = 90;
const GWAS_HITS: usize = 400;

fn metabolite_id(i: usize) -> String {
    format!("M{:03}", i + 1)
}

fn write_metabolite_info(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let mut w = csv::Writer::from_path(path).context("creating metabolite info file")?;
    w.write_record(["metabolite_id", "name", "subclass"])?;
    for i in 0..METABOLITES {
        let subclass = SUBCLASSES[rng.below(SUBCLASSES.len())];
        // Every tenth metabolite has no subclass.
        let subclass = if i % 10 == 9 { "" } else { subclass };
        w.write_record([metabolite_id(i), format!("Metabolite {}", i + 1), subclass.to_string()])?;
    }
    // Imperfect rows: blank id, then a duplicate that overrides M001.
    w.write_record(["", "Orphan", "Steroids"])?;
    w.write_record([metabolite_id(0).as_str(), "Metabolite 1 (revised)", SUBCLASSES[0]])?;
    w.flush()?;
    Ok(())
}

fn write_correlations(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let mut w = csv::Writer::from_path(path).context("creating correlations file")?;
    w.write_record(["metabolite_1", "metabolite_2"])?;
    for _ in 0..CORRELATIONS {
        // Pairs mostly within small neighbourhoods so clusters form.
        let a = rng.below(METABOLITES);
        let b = (a + 1 + rng.below(5)) % METABOLITES;
        w.write_record([metabolite_id(a), metabolite_id(b)])?;
    }
    // One endpoint missing from the info file, one row missing an endpoint.
    w.write_record(["M001", "X999"])?;
    w.write_record(["M002", ""])?;
    w.flush()?;
    Ok(())
}

fn write_gwas(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let mut w = csv::Writer::from_path(path).context("creating GWAS file")?;
    w.write_record(["metabolite_id", "snp", "position", "lod"])?;
    for i in 0..GWAS_HITS {
        let id = metabolite_id(rng.below(METABOLITES));
        let position = 1_000_000 + rng.below(250_000_000);
        let lod = 1.0 + rng.next_f64().powi(3) * 14.0;
        w.write_record([
            id,
            format!("rs{}", 10_000 + i),
            position.to_string(),
            format!("{lod:.3}"),
        ])?;
    }
    // Dropped by the position/lod filter.
    w.write_record(["M003", "rs1", "0", "5.0"])?;
    w.write_record(["M004", "rs2", "1500000", "0"])?;
    w.write_record(["M005", "rs3", "", "2.5"])?;
    w.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    write_metabolite_info(Path::new("metabolite_info.csv"), &mut rng)?;
    write_correlations(Path::new("correlations.csv"), &mut rng)?;
    write_gwas(Path::new("gwas_data.csv"), &mut rng)?;

    println!(
        "Wrote metabolite_info.csv ({METABOLITES} metabolites), correlations.csv \
         ({CORRELATIONS} pairs), gwas_data.csv ({GWAS_HITS} hits)"
    );
    Ok(())
}
