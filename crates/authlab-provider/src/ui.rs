//! Minimal server-rendered pages, styled from the configured theme.

use authlab_core::ThemeConfig;
use axum::response::Html;

pub fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn page(theme: &ThemeConfig, heading: &str, body: &str) -> Html<String> {
    let title = escape(&theme.title);
    let primary = escape(&theme.primary);
    let favicon = theme
        .favicon
        .as_ref()
        .map(|url| format!(r#"<link rel="icon" href="{}">"#, escape(url.as_str())))
        .unwrap_or_default();
    let logo = theme
        .logo
        .as_ref()
        .map(|logo| {
            format!(
                r#"<picture><source srcset="{dark}" media="(prefers-color-scheme: dark)"><img class="logo" src="{light}" alt="{title}"></picture>"#,
                dark = escape(logo.dark.as_str()),
                light = escape(logo.light.as_str()),
                title = title,
            )
        })
        .unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
{favicon}
<style>
:root {{ --primary: {primary}; }}
body {{ font-family: system-ui, sans-serif; display: flex; justify-content: center; padding-top: 10vh; }}
main {{ width: 320px; display: flex; flex-direction: column; gap: 12px; }}
.logo {{ max-height: 48px; }}
input {{ padding: 10px; border: 1px solid #ccc; border-radius: 4px; }}
button, .button {{ padding: 10px; border: none; border-radius: 4px; background: var(--primary); color: #fff; text-align: center; text-decoration: none; cursor: pointer; }}
form {{ display: flex; flex-direction: column; gap: 8px; }}
.error {{ color: #c00; }}
.link {{ background: none; color: var(--primary); }}
</style>
</head>
<body>
<main>
{logo}
<h1>{heading}</h1>
{body}
</main>
</body>
</html>"#,
        heading = escape(heading),
    ))
}

pub fn error_line(error: Option<&str>) -> String {
    error
        .map(|error| format!(r#"<p class="error">{}</p>"#, escape(error)))
        .unwrap_or_default()
}

/// Provider chooser shown when `/authorize` cannot pick one on its own.
pub fn select_page<'a>(theme: &ThemeConfig, providers: impl Iterator<Item = &'a str>) -> Html<String> {
    let links = providers
        .map(|name| {
            format!(
                r#"<a class="button" href="/{path}/authorize">Continue with {label}</a>"#,
                path = escape(name),
                label = escape(name),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    page(theme, "Sign in", &links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_handles_markup() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn page_uses_theme() {
        let theme = ThemeConfig {
            title: "myAuth".to_string(),
            primary: "#0051c3".to_string(),
            favicon: Some("https://example.com/favicon.ico".parse().unwrap()),
            logo: None,
        };
        let Html(html) = page(&theme, "Sign in", "<p>x</p>");
        assert!(html.contains("<title>myAuth</title>"));
        assert!(html.contains("--primary: #0051c3"));
        assert!(html.contains(r#"href="https://example.com/favicon.ico""#));
        assert!(html.contains("<p>x</p>"));
    }

    #[test]
    fn select_page_links_every_provider() {
        let Html(html) = select_page(&ThemeConfig::default(), ["password", "oauth2"].into_iter());
        assert!(html.contains(r#"href="/password/authorize""#));
        assert!(html.contains(r#"href="/oauth2/authorize""#));
    }
}
