use std::fmt::Write;

use super::SimulateResponse;
use super::report::{format_money, headline, totals_line};
use crate::core::MAX_MONTHS;

struct FieldGroup {
    title: &'static str,
    description: &'static str,
    fields: &'static [(&'static str, &'static str)],
}

const GROUPS: &[FieldGroup] = &[
    FieldGroup {
        title: "Owner: purchase & loan",
        description: "One-time costs and the fixed-rate mortgage. Fill in at most one down payment field; 20% applies when both are blank.",
        fields: &[
            ("homePrice", "Purchase price ($)"),
            ("downPayment", "Down payment ($)"),
            ("downPaymentPercent", "Down payment (% of price)"),
            ("mortgageRate", "Mortgage rate (% per year)"),
            ("termMonths", "Term (months)"),
            ("buyClosingCost", "Buyer closing costs (% of price)"),
            ("sellClosingCost", "Seller closing costs (% of value)"),
        ],
    },
    FieldGroup {
        title: "Owner: carrying costs",
        description: "Annual rates charged on the current home value.",
        fields: &[
            ("propertyTaxRate", "Property tax (% per year)"),
            ("insuranceRate", "Insurance (% per year)"),
            ("maintenanceRate", "Maintenance (% per year)"),
            ("appreciationRate", "Home appreciation (% per year)"),
        ],
    },
    FieldGroup {
        title: "Renter",
        description: "The renter invests the upfront cash and, in cheaper months, the difference.",
        fields: &[
            ("rent", "Starting rent ($/month)"),
            ("rentGrowthRate", "Rent growth (% per year)"),
        ],
    },
    FieldGroup {
        title: "Market & horizon",
        description: "Shared assumptions for both paths.",
        fields: &[
            ("investmentReturn", "Investment return (% per year)"),
            ("inflationRate", "Inflation (% per year)"),
            ("horizonMonths", "Horizon (months)"),
            ("targetMonth", "Solve rent for break-even by month (optional)"),
        ],
    },
];

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn value_of<'a>(values: &'a [(String, String)], key: &str) -> &'a str {
    values
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

pub(super) fn render_page(
    values: &[(String, String)],
    outcome: Option<Result<&SimulateResponse, &str>>,
) -> String {
    let mut html = String::new();
    html.push_str(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Rent vs buy break-even</title>\n\
         <link rel=\"stylesheet\" href=\"/styles.css\">\n</head>\n<body>\n<main>\n\
         <h1>Rent vs buy break-even</h1>\n",
    );

    match outcome {
        Some(Ok(response)) => render_result(&mut html, response),
        Some(Err(msg)) => {
            let _ = writeln!(
                html,
                "<p class=\"error\" role=\"alert\">{}</p>",
                escape_html(msg)
            );
        }
        None => {}
    }

    html.push_str("<form method=\"post\" action=\"/\">\n");
    for group in GROUPS {
        let _ = writeln!(
            html,
            "<fieldset>\n<legend>{}</legend>\n<p class=\"hint\">{}</p>",
            group.title, group.description
        );
        for (name, label) in group.fields {
            let bounds = match *name {
                "termMonths" | "horizonMonths" | "targetMonth" => {
                    format!(" min=\"0\" max=\"{MAX_MONTHS}\" step=\"1\"")
                }
                _ => " step=\"any\"".to_string(),
            };
            let _ = writeln!(
                html,
                "<label>{label}<input type=\"number\" name=\"{name}\"{bounds} value=\"{}\"></label>",
                escape_html(value_of(values, name))
            );
        }
        html.push_str("</fieldset>\n");
    }

    let real_selected = value_of(values, "reportMode") != "nominal";
    let _ = writeln!(
        html,
        "<fieldset>\n<legend>Compare in</legend>\n\
         <label><input type=\"radio\" name=\"reportMode\" value=\"real\"{}> Real dollars</label>\n\
         <label><input type=\"radio\" name=\"reportMode\" value=\"nominal\"{}> Nominal dollars</label>\n\
         </fieldset>",
        if real_selected { " checked" } else { "" },
        if real_selected { "" } else { " checked" }
    );
    html.push_str("<button type=\"submit\">Run simulation</button>\n</form>\n</main>\n</body>\n</html>\n");
    html
}

fn render_result(html: &mut String, response: &SimulateResponse) {
    let class = if response.break_even.is_reached() {
        "result reached"
    } else {
        "result not-reached"
    };
    let _ = writeln!(
        html,
        "<section class=\"{class}\">\n<h2>{}</h2>\n<ul>\n\
         <li>Owner wealth: {}</li>\n<li>Renter wealth: {}</li>\n\
         <li>Monthly mortgage payment: {}</li>\n<li>Upfront cash: {}</li>\n</ul>",
        escape_html(&headline(response)),
        format_money(response.break_even.owner_wealth()),
        format_money(response.break_even.renter_wealth()),
        format_money(response.monthly_payment),
        format_money(response.upfront_cash)
    );

    if let Some(solve) = &response.rent_solve {
        let text = match solve.solved_rent {
            Some(rent) => format!(
                "Lowest starting rent breaking even by month {}: {}/month.",
                solve.target_month,
                format_money(rent)
            ),
            None => solve.message.clone(),
        };
        let _ = writeln!(html, "<p>{}</p>", escape_html(&text));
    }

    html.push_str(
        "<table>\n<thead><tr><th>Month</th><th>Balance</th><th>Home value</th>\
         <th>Owner cost</th><th>Rent</th><th>Owner wealth</th><th>Renter wealth</th></tr></thead>\n<tbody>\n",
    );
    for c in &response.checkpoints {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            c.month,
            format_money(c.mortgage_balance),
            format_money(c.home_value),
            format_money(c.owner_cost),
            format_money(c.rent),
            format_money(c.owner_wealth),
            format_money(c.renter_wealth)
        );
    }
    html.push_str("</tbody>\n</table>\n");
    if let Some(last) = response.checkpoints.last() {
        let _ = writeln!(html, "<p class=\"hint\">{}</p>", escape_html(&totals_line(last)));
    }
    html.push_str("</section>\n");
}
