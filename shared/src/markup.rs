use maud::html;

/// Escape text for interpolation into markup handed to the map host.
pub fn escape_html(raw: &str) -> String {
    html! { (raw) }.into_string()
}
