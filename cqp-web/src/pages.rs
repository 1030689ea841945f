//! Server-rendered HTML for the intro and main pages
//!
//! Pages are rebuilt from scratch on every request; nothing here holds state.

use std::fmt::Write;

use cqp_common::features::{SCORE_MAX, SCORE_MIN, SCORE_STEP};
use cqp_common::{Feature, FeatureCount, ModelEntry, PredictionResult};

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 56rem; margin: 2rem auto; padding: 0 1rem; color: #2b1d14; }
h1 { color: #5b3a29; }
fieldset { border: 1px solid #d8c8b8; margin-bottom: 1rem; }
.slider { display: flex; gap: 1rem; align-items: center; }
.result { background: #eef7ee; border-left: 4px solid #3a7d44; padding: 0.5rem 1rem; }
.error { background: #fbeeee; border-left: 4px solid #a33; padding: 0.5rem 1rem; }
"#;

/// Everything the main page shows for one request
#[derive(Debug, Clone)]
pub struct MainView<'a> {
    pub count: FeatureCount,
    pub models: &'a [ModelEntry],
    pub selected: &'a ModelEntry,
    pub country: String,
    /// Slider positions in the selected model's feature order
    pub values: Vec<(Feature, f64)>,
    /// Latest prediction or error message; replaces any earlier display
    pub outcome: Option<Result<PredictionResult, String>>,
}

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Coffee Quality Prediction App</title>\n<style>{}</style>\n</head>\n\
         <body>\n{}\n</body>\n</html>\n",
        STYLE, body
    )
}

/// Intro page with the "Enter" button
pub fn render_intro() -> String {
    layout(
        r#"<h1>Coffee Quality Prediction App</h1>
<h2>Introduction</h2>
<p>This app uses flavor metrics to predict coffee quality, helping growers increase the profitability of their crops.</p>
<p>The global coffee industry was valued at 466 billion dollars in 2020 and is forecast to keep growing through 2026.</p>
<p>Coffee quality can be judged on many features. This tool uses data from the
<a href="https://database.coffeeinstitute.org">Coffee Quality Institute</a> and machine learning to predict overall
quality, the "Total Cup Points", from a reduced set of features or "Cupping Scores".</p>
<h2>Data</h2>
<p>The data covers more than 1300 samples across 8 quality metrics for coffee from several continents. The 8 metrics
were reduced to 4 to avoid multicollinearity and overfitting while improving interpretability and generalization.</p>
<ul>
<li>Any combination of 2 or 3 of these 4 metrics, together with a country name, gives reliable predictions on unseen
data with a root mean squared error of 0.341 to 0.377 after an 80/20 train/test split.</li>
<li>Country names are one-hot encoded before reaching the model, so a prediction can be penalized or boosted by the
country of origin.</li>
</ul>
<h2>Conclusion</h2>
<p>With the value of coffee growing every year, this tool helps coffee companies stay competitive globally.</p>
<form method="post" action="/enter"><button type="submit">Enter</button></form>"#,
    )
}

/// Main page: model selection, inputs, prediction outcome
pub fn render_main(view: &MainView<'_>) -> String {
    let mut body = String::new();

    body.push_str(
        "<h1>Coffee Quality Prediction App</h1>\n\
         <p>Welcome to the Coffee Predictor App! Predict coffee quality from a few selected features.</p>\n\
         <h2>What to do</h2>\n<ul>\n\
         <li>Select the number of features (2 or 3) for prediction.</li>\n\
         <li>Choose a model based on the selected number of features.</li>\n\
         <li>Enter the country of origin and the feature values.</li>\n\
         <li>Click \"Make Prediction\" to see the predicted Total Cup Points.</li>\n</ul>\n\
         <h2>Feature Description</h2>\n<ul>\n",
    );
    for feature in Feature::ALL {
        let _ = writeln!(
            body,
            "<li>{} = {}</li>",
            feature.name(),
            escape(feature.description())
        );
    }
    body.push_str("</ul>\n<form method=\"get\" action=\"/\">\n");

    // Feature count
    body.push_str("<fieldset><legend>Select Number of Features</legend>\n");
    for count in FeatureCount::ALL {
        let _ = writeln!(
            body,
            "<label><input type=\"radio\" name=\"features\" value=\"{0}\"{1} onchange=\"this.form.submit()\"> {0}</label>",
            count,
            if count == view.count { " checked" } else { "" }
        );
    }
    body.push_str("</fieldset>\n");

    // Model selection
    body.push_str("<fieldset><legend>Model and Feature Selection</legend>\n<select name=\"model\" onchange=\"this.form.submit()\">\n");
    for entry in view.models {
        let id = escape(&entry.identifier);
        let _ = writeln!(
            body,
            "<option value=\"{0}\"{1}>{0}</option>",
            id,
            if entry.identifier == view.selected.identifier {
                " selected"
            } else {
                ""
            }
        );
    }
    let _ = write!(
        body,
        "</select>\n<button type=\"submit\">Update selection</button>\n\
         <p>You have selected: <code>{}</code></p>\n<p>Features: {}</p>\n\
         <p>Selected Model RMSE: {}</p>\n</fieldset>\n",
        escape(&view.selected.identifier),
        view.selected.feature_names().join(", "),
        escape(&view.selected.rmse_label())
    );

    // Inputs
    let _ = write!(
        body,
        "<fieldset><legend>Country Selection</legend>\n\
         <label>Country of Origin <input type=\"text\" name=\"country\" value=\"{}\"></label>\n\
         </fieldset>\n<fieldset><legend>Feature Values</legend>\n",
        escape(&view.country)
    );
    for (feature, value) in &view.values {
        let _ = writeln!(
            body,
            "<div class=\"slider\"><label for=\"{0}\">{0} Value</label>\
             <input type=\"range\" id=\"{0}\" name=\"{0}\" min=\"{1}\" max=\"{2}\" step=\"{3}\" value=\"{4}\" \
             oninput=\"this.nextElementSibling.value=this.value\"><output>{4}</output></div>",
            feature.name(),
            SCORE_MIN,
            SCORE_MAX,
            SCORE_STEP,
            value
        );
    }
    body.push_str(
        "</fieldset>\n<button type=\"submit\" formmethod=\"post\" formaction=\"/predict\">Make Prediction</button>\n</form>\n",
    );

    match &view.outcome {
        Some(Ok(result)) => {
            let values: Vec<String> = result.prediction.iter().map(|v| v.to_string()).collect();
            let _ = writeln!(
                body,
                "<div class=\"result\"><strong>Prediction:</strong> [{}]</div>",
                values.join(", ")
            );
        }
        Some(Err(message)) => {
            let _ = writeln!(
                body,
                "<div class=\"error\"><strong>Prediction failed:</strong> {}</div>",
                escape(message)
            );
        }
        None => {}
    }

    body.push_str(
        "<form method=\"post\" action=\"/back\"><button type=\"submit\">Go Back to Intro Page</button></form>",
    );

    layout(&body)
}
