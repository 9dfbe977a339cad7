//! HTML pages for the form front end.

/// Input form posting the seven measurements to `/predict`.
pub const HOME_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Crop Advisor</title>
</head>
<body>
<h1>Crop Advisor</h1>
<p>Enter your soil and climate measurements to get crop suggestions.</p>
<form action="/predict" method="post">
  <label>Nitrogen (N, 0-100) <input name="N" type="number" step="1" min="0" max="100" required></label><br>
  <label>Phosphorus (P) <input name="P" type="number" step="1" required></label><br>
  <label>Potassium (K) <input name="K" type="number" step="1" required></label><br>
  <label>Temperature (&deg;C) <input name="temperature" type="number" step="any" required></label><br>
  <label>Humidity (%) <input name="humidity" type="number" step="any" required></label><br>
  <label>pH (0-14) <input name="PH" type="number" step="any" min="0" max="14" required></label><br>
  <label>Rainfall (mm) <input name="rainfall" type="number" step="any" required></label><br>
  <button type="submit">Suggest crops</button>
</form>
</body>
</html>
"#;

pub fn output_page(crops: &[String]) -> String {
    let body = if crops.is_empty() {
        "<p>No crops are associated with these conditions.</p>".to_string()
    } else {
        let items: String = crops
            .iter()
            .map(|c| format!("  <li>{}</li>\n", escape(c)))
            .collect();
        format!("<ul>\n{items}</ul>")
    };
    page("Suggested crops", &body)
}

pub fn error_page(message: &str) -> String {
    page("Request rejected", &format!("<p>{}</p>", escape(message)))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{body}\n<p><a href=\"/\">Back</a></p>\n</body>\n</html>\n"
    )
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
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
