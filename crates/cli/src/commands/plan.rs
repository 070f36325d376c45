use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use smartmenu_agent::parse_request;
use smartmenu_core::{format_price_kzt, generate_bundles, Bundle, Catalog, GuestIntent};

#[derive(Debug, Serialize)]
struct PlanOutput {
    intent: GuestIntent,
    bundles: Vec<Bundle>,
}

pub fn run(request: &str, seed: Option<u64>, json_output: bool) -> String {
    let catalog = Catalog::builtin();
    let intent = parse_request(request);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let bundles = generate_bundles(&catalog, &intent, &mut rng);

    if json_output {
        let output = PlanOutput { intent, bundles };
        return serde_json::to_string_pretty(&output)
            .unwrap_or_else(|error| format!("{{\"error\":\"serialization failed: {error}\"}}"));
    }

    render_human(&intent, &bundles)
}

fn render_human(intent: &GuestIntent, bundles: &[Bundle]) -> String {
    let mut lines = vec![format!(
        "Запрос: {} чел., бюджет {}",
        intent.people,
        format_price_kzt(intent.budget_kzt)
    )];

    for bundle in bundles {
        lines.push(String::new());
        lines.push(format!("{} — {}", bundle.name, format_price_kzt(bundle.total_kzt)));
        lines.push(format!("  {}", bundle.description));
        for item in &bundle.items {
            lines.push(format!(
                "  - {} ({}) — {}",
                item.name,
                item.id.as_str(),
                format_price_kzt(item.price_kzt)
            ));
        }
        if let Some(upsell) = &bundle.upsell {
            lines.push(format!(
                "  Рекомендуем добавить: {} — {}",
                upsell.name,
                format_price_kzt(upsell.price_kzt)
            ));
        }
    }

    lines.join("\n")
}
