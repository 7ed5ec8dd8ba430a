//! Runs the solver on the synthetic scenarios described in
//! `tests/data/scenarios.json` and checks the invariants each one expects.

use patchmatch::lowlevel::IntegralMask;
use patchmatch::{
    ImageView, Mask, PatchMatch, PatchMatchConfig, PatchMatchError, PatchRegion, Ssd,
};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    cases: Vec<Scenario>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct RectJson {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum Pattern {
    Xor,
    Stripes,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
enum ExpectedError {
    NoSourceRegions,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    width: usize,
    height: usize,
    pattern: Pattern,
    source: RectJson,
    patch_radius: usize,
    iterations: usize,
    seed: u64,
    #[serde(default = "default_k")]
    k: usize,
    #[serde(default)]
    min_exact_fraction: Option<f64>,
    #[serde(default)]
    expect_error: Option<ExpectedError>,
}

fn default_k() -> usize {
    1
}

fn render(pattern: Pattern, width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = match pattern {
                Pattern::Xor => ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF,
                // Period 8 horizontally, so the right half repeats the left.
                Pattern::Stripes => ((x % 8) * 29 + y * 11) % 251,
            };
            data.push(value as f32);
        }
    }
    data
}

fn load_scenarios() -> Vec<Scenario> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/scenarios.json");
    let text = fs::read_to_string(&path).expect("Failed to read scenarios.json");
    let file: ScenarioFile = serde_json::from_str(&text).expect("Failed to parse scenarios.json");
    file.cases
}

fn run_case(case: &Scenario) -> Result<(), String> {
    let data = render(case.pattern, case.width, case.height);
    let view = ImageView::from_slice(&data, case.width, case.height).map_err(|e| e.to_string())?;
    let rect = case.source;
    let source = Mask::from_fn(case.width, case.height, |p| {
        p.x >= rect.x && p.x < rect.x + rect.width && p.y >= rect.y && p.y < rect.y + rect.height
    })
    .map_err(|e| e.to_string())?;
    let target = source.inverted();
    let cfg = PatchMatchConfig {
        patch_radius: case.patch_radius,
        iterations: case.iterations,
        ..PatchMatchConfig::default()
    };

    let mut pm = PatchMatch::generalized(Ssd, cfg, case.k).with_seed(case.seed);
    let result = pm.compute(view, &source, &target);
    match (result, case.expect_error) {
        (Err(PatchMatchError::NoSourceRegions), Some(ExpectedError::NoSourceRegions)) => {
            return Ok(())
        }
        (Err(e), _) => return Err(format!("unexpected error: {e}")),
        (Ok(_), Some(expected)) => return Err(format!("expected {expected:?}, got a field")),
        (Ok(_), None) => {}
    }

    let field = pm.field().ok_or("solver holds no field")?;
    let index = IntegralMask::new(&source);
    let mut total = 0usize;
    let mut exact = 0usize;
    for (p, cell) in field.iter() {
        if !target.is_valid(p)
            || !PatchRegion::new(p, case.patch_radius).is_inside(case.width, case.height)
        {
            continue;
        }
        total += 1;
        if cell.is_empty() || cell.len() > case.k {
            return Err(format!("{p:?} holds {} matches", cell.len()));
        }
        for m in cell {
            if !index.is_region_valid(m.region) {
                return Err(format!("{p:?} matched invalid region {:?}", m.region));
            }
        }
        if cell.has_exact_match() {
            exact += 1;
        }
    }

    let stats = pm.stats();
    match (stats.initial_mean_score, stats.final_mean_score()) {
        (Some(initial), Some(last)) if last <= initial => {}
        (initial, last) => return Err(format!("mean score {initial:?} -> {last:?}")),
    }
    if let Some(min) = case.min_exact_fraction {
        let fraction = exact as f64 / total.max(1) as f64;
        if fraction < min {
            return Err(format!("exact fraction {fraction:.2} below {min}"));
        }
    }
    Ok(())
}

#[test]
fn scenarios_hold_their_invariants() {
    let cases = load_scenarios();
    assert!(!cases.is_empty());
    let failures: Vec<String> = cases
        .iter()
        .filter_map(|case| run_case(case).err().map(|e| format!("{}: {e}", case.name)))
        .collect();
    assert!(failures.is_empty(), "failed scenarios:\n{}", failures.join("\n"));
}
