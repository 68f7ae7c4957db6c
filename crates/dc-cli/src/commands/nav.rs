use dc_auth::permissions::{guard, navigation, show_sidebar};
use dc_auth::RouteDecision;
use serde::Serialize;

use crate::app::App;
use crate::output::render_fields;

#[derive(Serialize)]
struct RouteView<'a> {
    path: &'a str,
    allowed: bool,
    redirect: Option<&'static str>,
    sidebar: bool,
}

/// Without a path, the sidebar for the signed-in user. With one, what the
/// route guard decides for it.
pub fn run(app: &App, check: Option<&str>) -> anyhow::Result<()> {
    let user = app.auth.current_user();

    let Some(path) = check else {
        let user = app.require_user()?;
        return app.output.list(&navigation(&user));
    };

    let decision = guard(path, user.as_ref());
    let view = RouteView {
        path,
        allowed: decision == RouteDecision::Allow,
        redirect: match decision {
            RouteDecision::Allow => None,
            RouteDecision::Redirect(to) => Some(to),
        },
        sidebar: show_sidebar(path),
    };
    app.output.record(&view, || {
        render_fields(&[
            ("path", view.path.to_string()),
            (
                "decision",
                match view.redirect {
                    None => "allow".to_string(),
                    Some(to) => format!("redirect to {to}"),
                },
            ),
            ("sidebar", view.sidebar.to_string()),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{offline_app, signed_in};

    #[tokio::test]
    async fn test_nav_for_roles() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&offline_app(dir.path()), None).is_err());
        assert!(run(&offline_app(dir.path()), Some("/projects")).is_ok());

        let clerk = signed_in(dir.path(), false).await;
        assert!(run(&clerk, None).is_ok());
        assert!(run(&clerk, Some("/settings")).is_ok());
    }
}
