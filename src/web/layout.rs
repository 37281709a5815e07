//! Shared page chrome: stylesheet, navigation, notices and small form helpers

use crate::error::ValidationErrors;
use crate::models::Theme;
use crate::notifications::Notice;
use crate::session::AdminSession;

/// Navigation entries, in sidebar order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Dashboard,
    Users,
    Agencies,
    Applications,
    Alerts,
    Safety,
    Revenue,
    Activity,
    Logs,
    Settings,
}

impl Nav {
    const ALL: [Nav; 10] = [
        Nav::Dashboard,
        Nav::Users,
        Nav::Agencies,
        Nav::Applications,
        Nav::Alerts,
        Nav::Safety,
        Nav::Revenue,
        Nav::Activity,
        Nav::Logs,
        Nav::Settings,
    ];

    fn label(&self) -> &'static str {
        match self {
            Nav::Dashboard => "Dashboard",
            Nav::Users => "Users",
            Nav::Agencies => "Agencies",
            Nav::Applications => "Applications",
            Nav::Alerts => "Alerts",
            Nav::Safety => "Emergencies",
            Nav::Revenue => "Revenue",
            Nav::Activity => "Activity",
            Nav::Logs => "Logs",
            Nav::Settings => "Settings",
        }
    }

    fn href(&self) -> &'static str {
        match self {
            Nav::Dashboard => "/admin",
            Nav::Users => "/admin/users",
            Nav::Agencies => "/admin/agencies",
            Nav::Applications => "/admin/applications",
            Nav::Alerts => "/admin/alerts",
            Nav::Safety => "/admin/safety",
            Nav::Revenue => "/admin/revenue",
            Nav::Activity => "/admin/activity",
            Nav::Logs => "/admin/logs",
            Nav::Settings => "/admin/settings",
        }
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn notice_html(notice: &Notice) -> String {
    format!(
        r#"<div class="notice {}"><strong>{}</strong> {}</div>"#,
        notice.kind.as_str(),
        html_escape(&notice.title),
        html_escape(&notice.message)
    )
}

/// Full admin page around `body`
pub fn page(
    title: &str,
    nav: Nav,
    session: &AdminSession,
    notices: &[Notice],
    body: &str,
) -> String {
    let links: String = Nav::ALL
        .iter()
        .map(|item| {
            format!(
                r#"<a href="{}"{}>{}</a>"#,
                item.href(),
                if *item == nav { r#" class="active""# } else { "" },
                item.label()
            )
        })
        .collect();
    let notices: String = notices.iter().map(notice_html).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en" data-theme="{theme}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - TaraG Admin</title>
    <style>{css}</style>
</head>
<body>
    <nav class="navbar">
        <h1>TaraG Admin</h1>
        <span class="who">{admin} &middot; <a href="/admin/logout">Logout</a></span>
    </nav>
    <div class="shell">
        <aside class="sidebar">{links}</aside>
        <main class="container">
            <h2>{title}</h2>
            {notices}
            {body}
        </main>
    </div>
</body>
</html>"#,
        theme = session.theme.as_str(),
        title = html_escape(title),
        css = CSS,
        admin = html_escape(&session.admin_name()),
        links = links,
        notices = notices,
        body = body,
    )
}

/// Minimal page for screens outside a session (login, errors)
pub fn bare_page(title: &str, theme: Theme, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en" data-theme="{}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - TaraG Admin</title>
    <style>{}</style>
</head>
<body class="centered">
    <div class="card narrow">{}</div>
</body>
</html>"#,
        theme.as_str(),
        html_escape(title),
        CSS,
        body
    )
}

/// Inline error under a form field
pub fn field_error(errors: Option<&ValidationErrors>, field: &str) -> String {
    errors
        .and_then(|e| e.get(field))
        .map(|message| format!(r#"<div class="field-error">{}</div>"#, html_escape(message)))
        .unwrap_or_default()
}

/// `<option>` list with one entry selected
pub fn options<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>, selected: &str) -> String {
    items
        .into_iter()
        .map(|(value, label)| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                html_escape(value),
                if value == selected { " selected" } else { "" },
                html_escape(label)
            )
        })
        .collect()
}

/// Small inline form posting to `action` with a single button
pub fn action_button(action: &str, label: &str, class: &str) -> String {
    format!(
        r#"<form method="post" action="{}" class="inline"><button type="submit" class="btn {}">{}</button></form>"#,
        html_escape(action),
        class,
        html_escape(label)
    )
}

pub fn badge(text: &str, class: &str) -> String {
    format!(r#"<span class="badge {}">{}</span>"#, class, html_escape(text))
}

const CSS: &str = r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
:root { --bg: #1a1a2e; --panel: rgba(255,255,255,0.05); --border: rgba(255,255,255,0.1); --text: #fff; --muted: #a0a0a0; --accent: #2a9d8f; }
[data-theme="light"] { --bg: #f5f6fa; --panel: #fff; --border: #dcdde1; --text: #222; --muted: #666; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: var(--bg); color: var(--text); min-height: 100vh; }
body.centered { display: flex; align-items: center; justify-content: center; }
a { color: var(--accent); text-decoration: none; }
.navbar { background: var(--panel); padding: 1rem 2rem; display: flex; justify-content: space-between; align-items: center; border-bottom: 1px solid var(--border); }
.navbar h1 { font-size: 1.25rem; }
.who { color: var(--muted); }
.shell { display: flex; }
.sidebar { width: 200px; padding: 1rem; display: flex; flex-direction: column; gap: 0.25rem; border-right: 1px solid var(--border); min-height: calc(100vh - 60px); }
.sidebar a { color: var(--muted); padding: 0.5rem 0.75rem; border-radius: 6px; }
.sidebar a.active, .sidebar a:hover { background: var(--panel); color: var(--text); }
.container { flex: 1; padding: 2rem; max-width: 1400px; }
h2 { margin-bottom: 1rem; }
h3 { margin: 1.5rem 0 0.75rem; }
.card { background: var(--panel); border: 1px solid var(--border); border-radius: 12px; padding: 1.5rem; margin-bottom: 1rem; }
.card.narrow { max-width: 420px; width: 90%; }
.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 1rem; margin-bottom: 1.5rem; }
.stat .value { font-size: 1.8rem; font-weight: 600; }
.stat .label { color: var(--muted); font-size: 0.85rem; }
table { width: 100%; border-collapse: collapse; margin-bottom: 1rem; }
th, td { text-align: left; padding: 0.6rem; border-bottom: 1px solid var(--border); vertical-align: top; }
th { color: var(--muted); font-weight: 500; font-size: 0.85rem; }
form.inline { display: inline; }
form.filters { display: flex; gap: 0.5rem; margin-bottom: 1rem; flex-wrap: wrap; }
label { display: block; margin: 0.75rem 0 0.25rem; color: var(--muted); font-size: 0.9rem; }
input, select, textarea { width: 100%; padding: 0.5rem; border-radius: 6px; border: 1px solid var(--border); background: var(--bg); color: var(--text); }
form.filters input, form.filters select { width: auto; }
textarea { min-height: 90px; }
.btn { padding: 0.45rem 0.9rem; border-radius: 6px; border: none; cursor: pointer; background: var(--accent); color: #fff; margin: 0.1rem; }
.btn.warning { background: #f39c12; }
.btn.danger { background: #e74c3c; }
.btn.muted { background: #555; }
.btn:disabled { opacity: 0.5; cursor: not-allowed; }
.badge { padding: 0.15rem 0.5rem; border-radius: 999px; font-size: 0.8rem; background: #555; color: #fff; }
.badge.active, .badge.approved, .badge.Active { background: #2ecc71; }
.badge.warned, .badge.pending, .badge.under_review, .badge.medium { background: #f39c12; }
.badge.banned, .badge.suspended, .badge.rejected, .badge.high { background: #e74c3c; }
.badge.low, .badge.Sent { background: #3498db; }
.notice { padding: 0.75rem 1rem; border-radius: 8px; margin-bottom: 1rem; border: 1px solid var(--border); }
.notice.success { background: rgba(46,204,113,0.15); border-color: #2ecc71; }
.notice.error { background: rgba(231,76,60,0.15); border-color: #e74c3c; }
.notice.warning { background: rgba(243,156,18,0.15); border-color: #f39c12; }
.notice.info { background: rgba(52,152,219,0.15); border-color: #3498db; }
.field-error { color: #e74c3c; font-size: 0.85rem; margin-top: 0.25rem; }
.bar-row { display: flex; align-items: center; gap: 0.75rem; margin: 0.3rem 0; }
.bar-row .bar-label { width: 110px; color: var(--muted); }
.bar-track { flex: 1; }
.bar { height: 18px; background: var(--accent); border-radius: 4px; }
.log-container { background: #0d0d1a; color: #ddd; border-radius: 8px; padding: 1rem; font-family: 'SF Mono', 'Fira Code', monospace; font-size: 0.85rem; height: calc(100vh - 260px); overflow-y: auto; }
.log-entry { padding: 0.2rem 0; white-space: pre-wrap; word-break: break-all; }
.log-entry.ERROR { color: #e74c3c; }
.log-entry.WARN { color: #f39c12; }
.log-entry.DEBUG, .log-entry.TRACE { color: #888; }
.muted { color: var(--muted); }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NoticeKind;

    #[test]
    fn test_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_page_marks_active_nav_and_shows_notices() {
        let session = AdminSession::new("tok".to_string(), None, 60);
        let notices = [Notice::new(NoticeKind::Error, "Ban failed", "<boom>")];
        let html = page("Users", Nav::Users, &session, &notices, "<p>body</p>");

        assert!(html.contains(r#"<a href="/admin/users" class="active">Users</a>"#));
        assert!(html.contains(r#"<div class="notice error">"#));
        assert!(html.contains("&lt;boom&gt;"));
        assert!(html.contains(r#"data-theme="dark""#));
    }

    #[test]
    fn test_options_select() {
        let html = options([("a", "A"), ("b", "B")], "b");
        assert_eq!(
            html,
            r#"<option value="a">A</option><option value="b" selected>B</option>"#
        );
    }
}
