// Gateway page
//
// One self-contained HTML document. Every interpolated value goes
// through `Escaped`, including labels and names from configuration.

use std::fmt::{self, Display, Write as _};

use creamy_core::{CLEAR_SELECTION, GatewayView};

const STYLE: &str = r"
html, body {
  font-family: mono;
  background-color: #1b1b1b;
  color: #ababab;
}
form {
  display: flex;
  flex-direction: row;
  align-items: center;
}
.gateways {
  display: flex;
  flex-direction: column;
  justify-content: center;
}
.gateway {
  padding: 1em;
  margin: 1em;
  border: 1px solid rgba(0,0,0,0.5);
  display: flex;
  text-align: center;
  flex-direction: column;
  justify-content: center;
  align-items: center;
}
@media(min-width: 400px) {
  .gateways { max-width: 400px; }
  .gateway {
    text-align: unset;
    flex-direction: row;
    align-items: flex-start;
    justify-content: space-between;
  }
}
.gateway--active { background-color: #00550055; }
.gateway__status {
  display: flex;
  flex-direction: column;
  justify-content: center;
  align-items: center;
}
.status--online { color: lawngreen; }
.status--offline { color: crimson; }
";

/// HTML-escaped text.
pub struct Escaped<'a>(pub &'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#39;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// The page for one client.
pub struct GatewayPage<'a> {
    pub source: &'a str,
    pub gateways: &'a [GatewayView],
}

impl GatewayPage<'_> {
    /// Offer a separate "use router default" button: the client has an
    /// override, and no configured gateway already stands for clearing it.
    fn show_clear(&self) -> bool {
        self.gateways.iter().any(|g| g.active)
            && !self.gateways.iter().any(|g| g.name == CLEAR_SELECTION)
    }

    fn write_gateway(f: &mut fmt::Formatter<'_>, gateway: &GatewayView) -> fmt::Result {
        let class = if gateway.active {
            "gateway gateway--active"
        } else {
            "gateway gateway--inactive"
        };
        writeln!(f, r#"<div class="{class}">"#)?;
        if gateway.active {
            writeln!(f, "<strong>{}</strong>", Escaped(&gateway.label))?;
        } else {
            writeln!(f, "<span>{}</span>", Escaped(&gateway.label))?;
        }

        if gateway.known_status {
            f.write_str("<div class=\"gateway__status\">\n")?;
            if gateway.online {
                f.write_str("<span class=\"status status--online\">Online</span>\n")?;
            } else {
                f.write_str("<span class=\"status status--offline\">Offline</span>\n")?;
            }
            writeln!(f, "<span>{}</span>", Escaped(&gateway.roundtrip_time))?;
            f.write_str("</div>\n")?;
        }

        if gateway.active {
            f.write_str("<span>(active)</span>\n")?;
        } else {
            write_button(f, &gateway.name, "Activate")?;
        }
        f.write_str("</div>\n")
    }
}

fn write_button(f: &mut fmt::Formatter<'_>, value: &str, caption: &str) -> fmt::Result {
    writeln!(
        f,
        r#"<form method="POST"><button type="submit" name="gateway" value="{}">{}</button></form>"#,
        Escaped(value),
        Escaped(caption)
    )
}

impl Display for GatewayPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n")?;
        f.write_str("<meta charset=\"utf-8\">\n<title>Creamy Gateway Picker</title>\n")?;
        f.write_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        )?;
        writeln!(f, "<style>{STYLE}</style>")?;
        f.write_str("</head>\n<body>\n")?;
        writeln!(f, "<p>Hello <strong>{}</strong></p>", Escaped(self.source))?;

        f.write_str("<div class=\"gateways\">\n")?;
        for gateway in self.gateways {
            Self::write_gateway(f, gateway)?;
        }
        if self.show_clear() {
            f.write_str("<div class=\"gateway gateway--inactive\">\n<span>Router default</span>\n")?;
            write_button(f, CLEAR_SELECTION, "Activate")?;
            f.write_str("</div>\n")?;
        }
        f.write_str("</div>\n</body>\n</html>\n")
    }
}

/// Render the full page for `source`.
pub fn render_page(source: &str, gateways: &[GatewayView]) -> String {
    GatewayPage { source, gateways }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(name: &str, label: &str, active: bool) -> GatewayView {
        GatewayView {
            name: name.into(),
            label: label.into(),
            active,
            known_status: false,
            online: false,
            roundtrip_time: String::new(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            Escaped(r#"<a href="x">Tom & 'Jerry'</a>"#).to_string(),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn active_gateway_has_no_button() {
        let html = render_page(
            "10.0.0.5",
            &[view("WAN1", "Primary", false), view("WAN2", "Backup", true)],
        );
        assert!(html.contains("<p>Hello <strong>10.0.0.5</strong></p>"));
        assert!(html.contains(r#"value="WAN1">Activate"#));
        assert!(!html.contains(r#"value="WAN2""#));
        assert!(html.contains("<strong>Backup</strong>"));
        assert!(html.contains("(active)"));
    }

    #[test]
    fn status_block_only_for_known_status() {
        let mut online = view("WAN1", "Primary", false);
        online.known_status = true;
        online.online = true;
        online.roundtrip_time = "12.3ms".into();
        let mut offline = view("WAN2", "Backup", false);
        offline.known_status = true;

        let html = render_page("10.0.0.5", &[online, offline, view("LTE", "Cell", false)]);
        assert_eq!(html.matches("gateway__status").count(), 3); // 2 blocks + stylesheet
        assert!(html.contains("status--online\">Online"));
        assert!(html.contains("status--offline\">Offline"));
        assert!(html.contains("<span>12.3ms</span>"));
    }

    #[test]
    fn clear_button_only_when_override_active() {
        let idle = render_page("10.0.0.5", &[view("WAN1", "Primary", false)]);
        assert!(!idle.contains(CLEAR_SELECTION));

        let active = render_page("10.0.0.5", &[view("WAN1", "Primary", true)]);
        assert!(active.contains(&format!(r#"value="{CLEAR_SELECTION}""#)));
        assert!(active.contains("Router default"));
    }

    #[test]
    fn configured_sentinel_replaces_clear_button() {
        let html = render_page(
            "10.0.0.5",
            &[
                view(CLEAR_SELECTION, "No override", false),
                view("WAN1", "Primary", true),
            ],
        );
        assert_eq!(html.matches(CLEAR_SELECTION).count(), 1);
        assert!(!html.contains("Router default"));
    }

    #[test]
    fn hostile_source_is_escaped() {
        let html = render_page("<script>", &[]);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
