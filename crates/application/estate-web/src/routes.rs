//! Route definitions for the dashboard

/// All routes defined in the application
pub const ROUTES: &[(&str, &str, &str)] = &[
    // Page routes
    ("GET", "/", "Dashboard shell with the first view loaded"),

    // View router
    ("GET", "/view/:name", "Load a view (204 when already active)"),
    ("POST", "/view/:name/reload", "Retry loading a view"),

    // Analysis view
    ("POST", "/analysis/category/:key", "Select a chart category"),
    ("POST", "/analysis/city", "Change the district-chart city"),
    ("GET", "/analysis/modal", "Open the chart modal (?src=)"),
    ("POST", "/analysis/modal/close", "Close the chart modal"),

    // Prediction view
    ("GET", "/prediction/districts", "City -> district options"),
    ("GET", "/prediction/months", "Year -> month options"),
    ("POST", "/prediction/submit", "Request a price prediction"),

    // Chrome
    ("POST", "/sidebar/toggle", "Collapse or expand the sidebar"),
    ("POST", "/sidebar/resize", "Re-evaluate the sidebar for a viewport width"),

    // API routes
    ("GET", "/api/health", "Health check"),

    // Static assets
    ("GET", "/static/style.css", "CSS stylesheet"),
    ("GET", "/charts/*", "Chart images"),
];

/// Print all routes
pub fn print_routes() {
    println!("\nEstate Dashboard Routes:");
    println!("{:-<60}", "");
    for (method, path, desc) in ROUTES {
        println!("{:6} {:30} {}", method, path, desc);
    }
    println!();
}
