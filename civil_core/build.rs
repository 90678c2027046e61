//! Compiles `data/rate_tables.toml` into Rust source so the built-in rate
//! catalog needs no runtime parsing.
//!
//! Output: `$OUT_DIR/rate_tables.rs`, a `builtin_tables()` function included
//! by `src/rates/mod.rs`.

use std::collections::BTreeMap;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Deserialize;

const SOURCE: &str = "data/rate_tables.toml";
const DEFAULT_REGION: &str = "national";

#[derive(Deserialize)]
struct RegionDef {
    label: String,
    description: String,
    wage_type: String,
    source: String,
    last_updated: String,
    labor: BTreeMap<String, LaborDef>,
    materials: BTreeMap<String, BTreeMap<String, MaterialDef>>,
    equipment: BTreeMap<String, EquipmentDef>,
}

#[derive(Deserialize)]
struct LaborDef {
    hourly: f64,
    overtime: f64,
    title: String,
}

#[derive(Deserialize)]
struct MaterialDef {
    unit: String,
    cost: f64,
    description: String,
}

#[derive(Deserialize)]
struct EquipmentDef {
    daily: f64,
    hourly: f64,
    description: String,
}

fn wage_type_variant(slug: &str, wage_type: &str) -> &'static str {
    match wage_type {
        "open_shop" => "WageType::OpenShop",
        "prevailing_wage" => "WageType::PrevailingWage",
        "union_prevailing" => "WageType::UnionPrevailing",
        other => panic!("{}: region '{}' has unknown wage_type '{}'", SOURCE, slug, other),
    }
}

fn check_rate(slug: &str, what: &str, key: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        panic!("{}: region '{}' {} '{}' has invalid rate {}", SOURCE, slug, what, key, value);
    }
}

fn main() {
    println!("cargo:rerun-if-changed={}", SOURCE);
    println!("cargo:rerun-if-changed=build.rs");

    let text = fs::read_to_string(SOURCE).unwrap_or_else(|e| panic!("reading {}: {}", SOURCE, e));
    let regions: BTreeMap<String, RegionDef> =
        toml::from_str(&text).unwrap_or_else(|e| panic!("parsing {}: {}", SOURCE, e));

    if !regions.contains_key(DEFAULT_REGION) {
        panic!("{}: the '{}' region is required", SOURCE, DEFAULT_REGION);
    }

    let mut out = String::new();
    out.push_str("// @generated by build.rs from data/rate_tables.toml\n\n");
    out.push_str("pub(crate) fn builtin_tables() -> Vec<(&'static str, RegionRateTable)> {\n");
    out.push_str("    let mut tables = Vec::new();\n");

    for (slug, region) in &regions {
        let _ = writeln!(
            out,
            "\n    let mut t = RegionRateTable::new({:?}, {});",
            region.label,
            wage_type_variant(slug, &region.wage_type)
        );
        let _ = writeln!(out, "    t.description = {:?}.to_string();", region.description);
        let _ = writeln!(out, "    t.source = {:?}.to_string();", region.source);
        let _ = writeln!(out, "    t.last_updated = {:?}.to_string();", region.last_updated);

        for (key, rate) in &region.labor {
            check_rate(slug, "labor", key, rate.hourly);
            check_rate(slug, "labor", key, rate.overtime);
            let _ = writeln!(
                out,
                "    t.add_labor({:?}, {:?}, {:?}, {:?});",
                key, rate.hourly, rate.overtime, rate.title
            );
        }
        for (category, items) in &region.materials {
            for (key, rate) in items {
                check_rate(slug, "material", key, rate.cost);
                let _ = writeln!(
                    out,
                    "    t.add_material({:?}, {:?}, {:?}, {:?}, {:?});",
                    category, key, rate.unit, rate.cost, rate.description
                );
            }
        }
        for (key, rate) in &region.equipment {
            check_rate(slug, "equipment", key, rate.daily);
            check_rate(slug, "equipment", key, rate.hourly);
            let _ = writeln!(
                out,
                "    t.add_equipment({:?}, {:?}, {:?}, {:?});",
                key, rate.daily, rate.hourly, rate.description
            );
        }
        let _ = writeln!(out, "    tables.push(({:?}, t));", slug);
    }

    out.push_str("\n    tables\n}\n");

    let out_dir = env::var("OUT_DIR").unwrap_or_else(|e| panic!("OUT_DIR not set: {}", e));
    let dest = Path::new(&out_dir).join("rate_tables.rs");
    fs::write(&dest, out).unwrap_or_else(|e| panic!("writing {}: {}", dest.display(), e));
}
