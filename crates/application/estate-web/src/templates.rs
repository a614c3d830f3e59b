//! HTML templates for the dashboard
//!
//! Uses HTMX for server-driven updates: every interaction posts to the server,
//! which mutates the session's controllers and answers with the fragment to
//! swap in.

use estate_core::Bounds;
use estate_dashboard::panel::file_name;
use estate_dashboard::{
    AnalysisView, ChartModal, CitySelector, ImagePanel, LoadingOverlay, PanelItem, PredictionForm,
    ResultPanel, SelectControl, Sidebar, ViewController, ViewName,
};

/// Placeholder in a view partial replaced by the controller's markup
pub const VIEW_BODY_MARKER: &str = "<!-- view-body -->";

/// CSS styles
pub const STYLE_CSS: &str = r#"
:root {
    --bg-primary: #f4f6fa;
    --bg-secondary: #ffffff;
    --bg-sidebar: #1f2937;
    --accent: #2563eb;
    --accent-dim: #1d4ed8;
    --text-primary: #111827;
    --text-secondary: #6b7280;
    --text-inverse: #f9fafb;
    --border: #e5e7eb;
    --danger: #dc2626;
    --success: #16a34a;
}

* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
    background: var(--bg-primary);
    color: var(--text-primary);
    min-height: 100vh;
    line-height: 1.5;
}

/* Layout */
.layout {
    display: flex;
    min-height: 100vh;
}

.main-content {
    flex: 1;
    padding: 24px;
    overflow-x: hidden;
}

/* Navbar (mobile only) */
.navbar {
    display: none;
    align-items: center;
    gap: 12px;
    padding: 12px 16px;
    background: var(--bg-sidebar);
    color: var(--text-inverse);
}

.navbar-toggle,
.sidebar-toggle {
    background: none;
    border: none;
    color: inherit;
    font-size: 1.4em;
    cursor: pointer;
}

/* Sidebar */
.sidebar {
    background: var(--bg-sidebar);
    color: var(--text-inverse);
    transition: width 0.2s, transform 0.2s;
    overflow: hidden;
}

.sidebar-header {
    display: flex;
    align-items: center;
    justify-content: space-between;
    padding: 16px;
}

.sidebar-title {
    font-weight: 600;
    white-space: nowrap;
}

.sidebar.desktop-expanded { width: 240px; }
.sidebar.desktop-collapsed { width: 64px; }

.sidebar.mobile-closed,
.sidebar.mobile-opened {
    position: fixed;
    top: 0;
    left: 0;
    bottom: 0;
    width: 240px;
    z-index: 20;
}

.sidebar.mobile-closed { transform: translateX(-100%); }
.sidebar.mobile-opened { transform: translateX(0); }

.view-nav {
    display: flex;
    flex-direction: column;
    gap: 4px;
    padding: 8px;
}

.nav-btn {
    background: none;
    border: none;
    color: var(--text-inverse);
    text-align: left;
    padding: 10px 12px;
    border-radius: 6px;
    cursor: pointer;
    white-space: nowrap;
}

.nav-btn:hover { background: rgba(255, 255, 255, 0.08); }
.nav-btn.active { background: var(--accent); }

@media (max-width: 799px) {
    .navbar { display: flex; }
    .main-content { padding: 16px; }
}

/* Views */
.view-header { margin-bottom: 20px; }
.view-header h1 { font-size: 1.6em; }
.view-header p { color: var(--text-secondary); }

/* Analysis */
.category-nav {
    display: flex;
    flex-wrap: wrap;
    gap: 8px;
    margin-bottom: 16px;
}

.category-btn {
    background: var(--bg-secondary);
    border: 1px solid var(--border);
    border-radius: 999px;
    padding: 6px 14px;
    cursor: pointer;
}

.category-btn.active {
    background: var(--accent);
    border-color: var(--accent);
    color: var(--text-inverse);
}

.city-selector { margin-bottom: 16px; }

.chart-section-title {
    margin: 20px 0 10px;
    font-size: 1.1em;
}

.chart-grid {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(360px, 1fr));
    gap: 16px;
}

.chart {
    width: 100%;
    background: var(--bg-secondary);
    border: 1px solid var(--border);
    border-radius: 8px;
    cursor: zoom-in;
}

.chart-placeholder {
    display: flex;
    align-items: center;
    justify-content: center;
    min-height: 200px;
    background: var(--bg-secondary);
    border: 1px dashed var(--border);
    border-radius: 8px;
    color: var(--text-secondary);
    padding: 12px;
    text-align: center;
}

/* Chart modal */
.modal { display: none; }

.modal.open {
    display: flex;
    position: fixed;
    inset: 0;
    z-index: 40;
    align-items: center;
    justify-content: center;
}

.modal-backdrop {
    position: absolute;
    inset: 0;
    background: rgba(0, 0, 0, 0.7);
}

.modal-content {
    position: relative;
    max-width: 90vw;
    max-height: 90vh;
}

.modal-content img {
    max-width: 90vw;
    max-height: 85vh;
    border-radius: 8px;
}

.modal-close {
    position: absolute;
    top: -36px;
    right: 0;
    background: none;
    border: none;
    color: #fff;
    font-size: 1.8em;
    cursor: pointer;
}

/* Prediction */
.prediction-form fieldset {
    border: none;
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(220px, 1fr));
    gap: 16px;
    background: var(--bg-secondary);
    padding: 20px;
    border-radius: 8px;
}

.field {
    display: flex;
    flex-direction: column;
    gap: 4px;
}

.field label {
    font-size: 0.9em;
    color: var(--text-secondary);
}

.field select,
.field input {
    padding: 8px;
    border: 1px solid var(--border);
    border-radius: 6px;
    font-size: 1em;
}

.submit-btn {
    align-self: end;
    background: var(--accent);
    color: var(--text-inverse);
    border: none;
    border-radius: 6px;
    padding: 10px 16px;
    cursor: pointer;
}

.submit-btn:hover { background: var(--accent-dim); }

.result {
    margin-top: 20px;
    padding: 16px;
    border-radius: 8px;
    background: var(--bg-secondary);
}

.result.hidden { display: none; }
.result.success { border-left: 4px solid var(--success); }
.result.error { border-left: 4px solid var(--danger); }

/* Loading overlay */
.loading-overlay {
    display: none;
    position: fixed;
    inset: 0;
    z-index: 30;
    background: rgba(255, 255, 255, 0.7);
    align-items: center;
    justify-content: center;
    flex-direction: column;
    gap: 12px;
}

.loading-overlay.visible,
.loading-overlay.htmx-request {
    display: flex;
}

.spinner {
    width: 40px;
    height: 40px;
    border: 4px solid var(--border);
    border-top-color: var(--accent);
    border-radius: 50%;
    animation: spin 0.8s linear infinite;
}

@keyframes spin {
    to { transform: rotate(360deg); }
}

/* Failures */
.load-failed,
.error-panel {
    background: var(--bg-secondary);
    border-left: 4px solid var(--danger);
    padding: 20px;
    border-radius: 8px;
}

.load-failed .detail {
    color: var(--text-secondary);
    font-size: 0.85em;
    margin: 8px 0 12px;
}

.retry-btn {
    background: var(--danger);
    color: #fff;
    border: none;
    border-radius: 6px;
    padding: 8px 14px;
    cursor: pointer;
}
"#;

/// Swaps a chart that fails to decode for a placeholder
const CHART_FALLBACK_JS: &str = r#"function estateChartFailed(img) {
    var box = document.createElement('div');
    box.className = 'chart-placeholder';
    box.textContent = 'Chart not available: ' + img.dataset.filename;
    img.replaceWith(box);
}"#;

const WIDTH_VALS: &str = "js:{width: window.innerWidth}";

/// Escape a string for HTML text and attribute positions
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn url_encode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn active_class(active: bool) -> &'static str {
    if active {
        " active"
    } else {
        ""
    }
}

/// Full page: navbar, sidebar and the main content area
pub fn page_html(sidebar: &Sidebar, main: &str) -> String {
    format!(
"<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>Real Estate Analytics</title>
    <link rel=\"stylesheet\" href=\"/static/style.css\">
    <script src=\"https://unpkg.com/htmx.org@1.9.10\"></script>
    <script>{}</script>
</head>
<body>
    <header class=\"navbar\">
        <button class=\"navbar-toggle\" hx-post=\"/sidebar/toggle\" hx-vals=\"{}\" hx-target=\"#sidebar\" hx-swap=\"outerHTML\" aria-label=\"Open menu\">&#9776;</button>
        <span class=\"navbar-title\">Real Estate Analytics</span>
    </header>
    <div class=\"layout\">
        {}
        <main id=\"main-content\" class=\"main-content\">
            {}
        </main>
    </div>
    <div hidden hx-post=\"/sidebar/resize\" hx-trigger=\"load, resize from:window delay:250ms\" hx-vals=\"{}\" hx-target=\"#sidebar\" hx-swap=\"outerHTML\"></div>
</body>
</html>",
        CHART_FALLBACK_JS,
        WIDTH_VALS,
        sidebar_html(sidebar),
        main,
        WIDTH_VALS
    )
}

/// Sidebar with the view nav
pub fn sidebar_html(sidebar: &Sidebar) -> String {
    let presentation = sidebar.presentation();
    let title = if presentation.shows_labels() {
        "Real Estate"
    } else {
        ""
    };
    format!(
        "<aside id=\"sidebar\" class=\"{}\">
            <div class=\"sidebar-header\">
                <span class=\"sidebar-title\">{}</span>
                <button class=\"sidebar-toggle\" hx-post=\"/sidebar/toggle\" hx-vals=\"{}\" hx-target=\"#sidebar\" hx-swap=\"outerHTML\" aria-label=\"Toggle sidebar\">&#9776;</button>
            </div>
            {}
        </aside>",
        presentation.css_class(),
        title,
        WIDTH_VALS,
        nav_html(sidebar, false)
    )
}

/// View nav. `oob` renders it for an out-of-band swap alongside a view.
pub fn nav_html(sidebar: &Sidebar, oob: bool) -> String {
    let labels = sidebar.presentation().shows_labels();
    let buttons: String = sidebar
        .nav()
        .states()
        .map(|(view, active)| {
            let text = if labels {
                view.label().to_string()
            } else {
                view.label().chars().take(1).collect()
            };
            format!(
                "<button class=\"nav-btn{}\" hx-get=\"/view/{}\" hx-target=\"#main-content\" hx-swap=\"innerHTML\" title=\"{}\">{}</button>",
                active_class(active),
                view.as_str(),
                view.label(),
                text
            )
        })
        .collect();
    let oob = if oob { " hx-swap-oob=\"true\"" } else { "" };
    format!("<nav id=\"view-nav\" class=\"view-nav\"{}>{}</nav>", oob, buttons)
}

/// A loaded view: its partial with the controller's markup inserted
pub fn view_html(fragment: &str, controller: &ViewController) -> String {
    let body = match controller {
        ViewController::Analysis(view) => analysis_html(view),
        ViewController::Prediction(form) => prediction_html(form),
    };
    if fragment.contains(VIEW_BODY_MARKER) {
        fragment.replacen(VIEW_BODY_MARKER, &body, 1)
    } else {
        format!("{}\n{}", fragment, body)
    }
}

/// Failure panel with a manual retry
pub fn load_failed_html(view: ViewName, detail: &str) -> String {
    format!(
        "<div class=\"load-failed\">
            <p>Failed to load {}.</p>
            <p class=\"detail\">{}</p>
            <button class=\"retry-btn\" hx-post=\"/view/{}/reload\" hx-target=\"#main-content\" hx-swap=\"innerHTML\">Retry</button>
        </div>",
        view.label(),
        html_escape(detail),
        view.as_str()
    )
}

pub fn error_html(message: &str) -> String {
    format!("<div class=\"error-panel\"><p>{}</p></div>", html_escape(message))
}

// ============== Analysis ==============

pub fn analysis_html(view: &AnalysisView) -> String {
    let buttons: String = view
        .nav()
        .states()
        .map(|(category, active)| {
            format!(
                "<button class=\"category-btn{}\" hx-post=\"/analysis/category/{}\" hx-target=\"#analysis-body\" hx-swap=\"outerHTML\">{}</button>",
                active_class(active),
                category.key(),
                category.label()
            )
        })
        .collect();

    format!(
        "<div id=\"analysis-body\" class=\"analysis\">
            <nav class=\"category-nav\">{}</nav>
            {}
            {}
            {}
        </div>",
        buttons,
        city_selector_html(view.city_selector()),
        panel_html(view.panel()),
        modal_html(view.modal())
    )
}

fn city_selector_html(selector: &CitySelector) -> String {
    if !selector.is_visible() {
        return String::new();
    }
    let options: String = selector
        .options()
        .iter()
        .map(|city| {
            let selected = if selector.selected() == Some(city.as_str()) {
                " selected"
            } else {
                ""
            };
            let city = html_escape(city);
            format!("<option value=\"{}\"{}>{}</option>", city, selected, city)
        })
        .collect();
    format!(
        "<div class=\"city-selector field\">
            <label for=\"analysis-city\">City</label>
            <select id=\"analysis-city\" name=\"city\" hx-post=\"/analysis/city\" hx-trigger=\"change\" hx-target=\"#analysis-body\" hx-swap=\"outerHTML\">{}</select>
        </div>",
        options
    )
}

pub fn panel_html(panel: &ImagePanel) -> String {
    let sections: String = panel
        .sections()
        .iter()
        .map(|section| {
            let title = section
                .title
                .as_deref()
                .map(|t| format!("<h3 class=\"chart-section-title\">{}</h3>", html_escape(t)))
                .unwrap_or_default();
            let items: String = section.items.iter().map(panel_item_html).collect();
            format!("{}<div class=\"chart-grid\">{}</div>", title, items)
        })
        .collect();
    format!("<div id=\"chart-panel\" class=\"chart-panel\">{}</div>", sections)
}

fn panel_item_html(item: &PanelItem) -> String {
    match item {
        PanelItem::Chart { src, alt } => format!(
            "<img class=\"chart\" src=\"{}\" alt=\"{}\" loading=\"lazy\" data-filename=\"{}\" onerror=\"estateChartFailed(this)\" hx-get=\"/analysis/modal?src={}\" hx-target=\"#chart-modal\" hx-swap=\"outerHTML\">",
            html_escape(src),
            html_escape(alt),
            html_escape(file_name(src)),
            url_encode(src)
        ),
        PanelItem::Placeholder { filename } => format!(
            "<div class=\"chart-placeholder\">Chart not available: {}</div>",
            html_escape(filename)
        ),
    }
}

pub fn modal_html(modal: &ChartModal) -> String {
    match modal.image() {
        Some(src) => format!(
            "<div id=\"chart-modal\" class=\"modal open\">
                <div class=\"modal-backdrop\" hx-post=\"/analysis/modal/close\" hx-target=\"#chart-modal\" hx-swap=\"outerHTML\"></div>
                <div class=\"modal-content\">
                    <button class=\"modal-close\" hx-post=\"/analysis/modal/close\" hx-target=\"#chart-modal\" hx-swap=\"outerHTML\" aria-label=\"Close\">&times;</button>
                    <img src=\"{}\" alt=\"{}\">
                </div>
            </div>",
            html_escape(src),
            html_escape(file_name(src))
        ),
        None => "<div id=\"chart-modal\" class=\"modal\"></div>".to_string(),
    }
}

// ============== Prediction ==============

pub fn prediction_html(form: &PredictionForm) -> String {
    let controls = form.controls();
    let bounds = form.metadata().ok().and_then(|m| m.validation_bounds);
    let disabled = if form.state().is_interactive() {
        ""
    } else {
        " disabled"
    };

    let city = select_html(
        "city",
        "City",
        &controls.city,
        "Select city",
        " hx-get=\"/prediction/districts\" hx-trigger=\"change\" hx-target=\"#district-field\" hx-swap=\"outerHTML\"",
    );
    let year = select_html(
        "year",
        "Year",
        &controls.year,
        "Select year",
        " hx-get=\"/prediction/months\" hx-trigger=\"change\" hx-target=\"#month-field\" hx-swap=\"outerHTML\"",
    );
    let area = numeric_html("area_m2", "Area (m²)", &controls.area, bounds.map(|b| b.area_m2), true);
    let bedrooms = numeric_html("bedrooms", "Bedrooms", &controls.bedrooms, bounds.map(|b| b.bedrooms), false);
    let floor = numeric_html("floor", "Floor", &controls.floor, bounds.map(|b| b.floor), false);

    format!(
        "<div id=\"prediction-body\" class=\"prediction\">
            <form id=\"prediction-form\" class=\"prediction-form\" hx-post=\"/prediction/submit\" hx-target=\"#prediction-result\" hx-swap=\"outerHTML\" hx-indicator=\"#loading-overlay\" hx-disabled-elt=\"find fieldset\">
                <fieldset{}>
                    {}
                    {}
                    {}
                    {}
                    {}
                    {}
                    {}
                    <button type=\"submit\" class=\"submit-btn\">Predict price</button>
                </fieldset>
            </form>
            {}
            {}
        </div>",
        disabled,
        city,
        district_field_html(form),
        area,
        bedrooms,
        floor,
        year,
        month_field_html(form),
        result_html(form.result()),
        overlay_html(form.overlay(), false)
    )
}

pub fn district_field_html(form: &PredictionForm) -> String {
    select_html("district", "District", &form.controls().district, "Select district", "")
}

pub fn month_field_html(form: &PredictionForm) -> String {
    select_html("month", "Month", &form.controls().month, "Select month", "")
}

fn select_html(name: &str, label: &str, control: &SelectControl, placeholder: &str, attrs: &str) -> String {
    let options: String = control
        .options()
        .iter()
        .map(|option| {
            let selected = if control.selected() == Some(option.value.as_str()) {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{}\"{}>{}</option>",
                html_escape(&option.value),
                selected,
                html_escape(&option.label)
            )
        })
        .collect();
    let disabled = if control.is_enabled() { "" } else { " disabled" };
    format!(
        "<div class=\"field\" id=\"{name}-field\">
            <label for=\"{name}\">{label}</label>
            <select id=\"{name}\" name=\"{name}\"{disabled}{attrs}><option value=\"\">{placeholder}</option>{options}</select>
        </div>"
    )
}

/// A bounded dropdown when the control has options, a number input otherwise
fn numeric_html(name: &str, label: &str, control: &SelectControl, bounds: Option<Bounds>, required: bool) -> String {
    if !control.options().is_empty() {
        let placeholder = format!("Select {}", label.to_lowercase());
        return select_html(name, label, control, &placeholder, "");
    }
    let limits = bounds
        .map(|b| format!(" min=\"{}\" max=\"{}\"", b.min, b.max))
        .unwrap_or_default();
    let value = control
        .selected()
        .map(|v| format!(" value=\"{}\"", html_escape(v)))
        .unwrap_or_default();
    let required = if required { " required" } else { "" };
    format!(
        "<div class=\"field\" id=\"{name}-field\">
            <label for=\"{name}\">{label}</label>
            <input type=\"number\" id=\"{name}\" name=\"{name}\" step=\"any\"{limits}{value}{required}>
        </div>"
    )
}

pub fn result_html(result: Option<&ResultPanel>) -> String {
    let Some(result) = result else {
        return "<div id=\"prediction-result\" class=\"result hidden\"></div>".to_string();
    };
    let class = if result.is_success() { "success" } else { "error" };
    let lines: String = result
        .lines()
        .iter()
        .map(|line| format!("<p>{}</p>", html_escape(line)))
        .collect();
    format!("<div id=\"prediction-result\" class=\"result {}\">{}</div>", class, lines)
}

/// Result box for a submit rejected before reaching the backend
pub fn result_error_html(message: &str) -> String {
    format!(
        "<div id=\"prediction-result\" class=\"result error\"><p>{}</p></div>",
        html_escape(message)
    )
}

pub fn overlay_html(overlay: &LoadingOverlay, oob: bool) -> String {
    let visible = if overlay.is_visible() { " visible" } else { "" };
    let oob = if oob { " hx-swap-oob=\"true\"" } else { "" };
    format!(
        "<div id=\"loading-overlay\" class=\"loading-overlay{}\"{}>
            <div class=\"spinner\"></div>
            <p>Calculating prediction...</p>
        </div>",
        visible, oob
    )
}
