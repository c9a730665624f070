//! Route authorization guard.
//!
//! Decides whether a navigation may proceed given the caller's session.
//! The guard is a pure function of `(path, session)`: it performs no I/O and
//! never fails. Paths are classified by segment-prefix matching against a
//! small rule set:
//!
//! ```text
//! 1. unauthenticated-only   /login, /lc (and below)
//! 2. public                 /authorize, /device, /health, /healthz (exact)
//! 3. admin-only             /settings/admin (and below)
//! 4. protected              everything else
//! ```
//!
//! The first matching class wins. The rule families are disjoint, which
//! `RouteRulesBuilder::build` enforces for custom rule sets.

use crate::models::Session;
use thiserror::Error;

/// Where signed-out callers are sent.
pub const LOGIN_PATH: &str = "/login";

/// Where signed-in callers are sent when a page is not for them.
pub const AUTHENTICATED_LANDING_PATH: &str = "/settings";

/// Classification of a navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathClass {
    /// Only reachable while signed out (login pages).
    UnauthenticatedOnly,
    /// Reachable regardless of authentication state.
    Public,
    /// Requires a signed-in administrator.
    AdminOnly,
    /// Requires a signed-in user.
    Protected,
}

impl PathClass {
    /// Bounded label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            PathClass::UnauthenticatedOnly => "unauthenticated_only",
            PathClass::Public => "public",
            PathClass::AdminOnly => "admin_only",
            PathClass::Protected => "protected",
        }
    }
}

/// Outcome of a navigation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    RedirectTo(String),
}

/// Rule set rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleConflict {
    #[error("Invalid rule '{0}': rules must be absolute paths without query or fragment")]
    InvalidRule(String),

    #[error("Rules '{0}' and '{1}' overlap")]
    Overlap(String, String),

    #[error("Redirect target '{0}' would redirect again")]
    RedirectLoop(String),
}

/// Path rule set used by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRules {
    unauthenticated_only: Vec<String>,
    public: Vec<String>,
    admin_only: Vec<String>,
    login_path: String,
    landing_path: String,
}

impl RouteRules {
    pub fn builder() -> RouteRulesBuilder {
        RouteRulesBuilder::default()
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// Classify a path. Total: every string maps to exactly one class.
    pub fn classify(&self, path: &str) -> PathClass {
        let path = strip_query(path);

        if self
            .unauthenticated_only
            .iter()
            .any(|root| is_segment_prefix(root, path))
        {
            PathClass::UnauthenticatedOnly
        } else if self.public.iter().any(|p| p == path) {
            PathClass::Public
        } else if self
            .admin_only
            .iter()
            .any(|root| is_segment_prefix(root, path))
        {
            PathClass::AdminOnly
        } else {
            PathClass::Protected
        }
    }
}

impl Default for RouteRules {
    fn default() -> Self {
        Self {
            unauthenticated_only: vec!["/login".to_string(), "/lc".to_string()],
            public: vec![
                "/authorize".to_string(),
                "/device".to_string(),
                "/health".to_string(),
                "/healthz".to_string(),
            ],
            admin_only: vec!["/settings/admin".to_string()],
            login_path: LOGIN_PATH.to_string(),
            landing_path: AUTHENTICATED_LANDING_PATH.to_string(),
        }
    }
}

/// Builder for custom rule sets; starts from the default rules.
#[derive(Debug, Clone, Default)]
pub struct RouteRulesBuilder {
    extra_unauthenticated_only: Vec<String>,
    extra_public: Vec<String>,
    extra_admin_only: Vec<String>,
    login_path: Option<String>,
    landing_path: Option<String>,
}

impl RouteRulesBuilder {
    /// Add a root that, with everything below it, is only for signed-out callers.
    pub fn unauthenticated_only(mut self, root: impl Into<String>) -> Self {
        self.extra_unauthenticated_only.push(root.into());
        self
    }

    /// Add an exact path reachable by everyone.
    pub fn public(mut self, path: impl Into<String>) -> Self {
        self.extra_public.push(path.into());
        self
    }

    /// Add a root that, with everything below it, requires an administrator.
    pub fn admin_only(mut self, root: impl Into<String>) -> Self {
        self.extra_admin_only.push(root.into());
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    pub fn landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = Some(path.into());
        self
    }

    /// Validate and build the rule set.
    ///
    /// # Errors
    ///
    /// - `RuleConflict::InvalidRule` for relative paths, `/` as a prefix
    ///   root, or rules carrying a query/fragment
    /// - `RuleConflict::Overlap` if a path could match two classes
    /// - `RuleConflict::RedirectLoop` if the login page is not
    ///   unauthenticated-only or the landing page is not plain protected
    pub fn build(self) -> Result<RouteRules, RuleConflict> {
        let mut rules = RouteRules::default();
        rules
            .unauthenticated_only
            .extend(self.extra_unauthenticated_only);
        rules.public.extend(self.extra_public);
        rules.admin_only.extend(self.extra_admin_only);
        if let Some(login) = self.login_path {
            rules.login_path = login;
        }
        if let Some(landing) = self.landing_path {
            rules.landing_path = landing;
        }

        for root in rules.unauthenticated_only.iter().chain(&rules.admin_only) {
            if !is_well_formed(root) || root == "/" {
                return Err(RuleConflict::InvalidRule(root.clone()));
            }
        }
        for path in rules
            .public
            .iter()
            .chain([&rules.login_path, &rules.landing_path])
        {
            if !is_well_formed(path) {
                return Err(RuleConflict::InvalidRule(path.clone()));
            }
        }

        // Prefix families must not nest into each other
        for unauth in &rules.unauthenticated_only {
            for admin in &rules.admin_only {
                if is_segment_prefix(unauth, admin) || is_segment_prefix(admin, unauth) {
                    return Err(RuleConflict::Overlap(unauth.clone(), admin.clone()));
                }
            }
        }

        // Public paths must not fall under either prefix family
        for public in &rules.public {
            if let Some(root) = rules
                .unauthenticated_only
                .iter()
                .chain(&rules.admin_only)
                .find(|root| is_segment_prefix(root, public))
            {
                return Err(RuleConflict::Overlap(root.clone(), public.clone()));
            }
        }

        if rules.classify(&rules.login_path) != PathClass::UnauthenticatedOnly {
            return Err(RuleConflict::RedirectLoop(rules.login_path.clone()));
        }
        if rules.classify(&rules.landing_path) != PathClass::Protected {
            return Err(RuleConflict::RedirectLoop(rules.landing_path.clone()));
        }

        Ok(rules)
    }
}

/// Route authorization guard.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    rules: RouteRules,
}

impl RouteGuard {
    pub fn new(rules: RouteRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RouteRules {
        &self.rules
    }

    pub fn classify(&self, path: &str) -> PathClass {
        self.rules.classify(path)
    }

    /// Decide whether `session` may navigate to `path`.
    pub fn decide(&self, path: &str, session: &Session) -> NavigationDecision {
        self.decide_classified(self.classify(path), session)
    }

    /// Apply the decision table to an already classified path.
    pub fn decide_classified(&self, class: PathClass, session: &Session) -> NavigationDecision {
        let signed_in = session.is_signed_in();

        match class {
            PathClass::Public => NavigationDecision::Allow,
            PathClass::UnauthenticatedOnly if signed_in => self.to_landing(),
            PathClass::UnauthenticatedOnly => NavigationDecision::Allow,
            PathClass::AdminOnly if !signed_in => self.to_login(),
            PathClass::AdminOnly if session.is_admin() => NavigationDecision::Allow,
            PathClass::AdminOnly => self.to_landing(),
            PathClass::Protected if signed_in => NavigationDecision::Allow,
            PathClass::Protected => self.to_login(),
        }
    }

    fn to_login(&self) -> NavigationDecision {
        NavigationDecision::RedirectTo(self.rules.login_path.clone())
    }

    fn to_landing(&self) -> NavigationDecision {
        NavigationDecision::RedirectTo(self.rules.landing_path.clone())
    }
}

/// `root` equals `path` or is a whole-segment prefix of it.
fn is_segment_prefix(root: &str, path: &str) -> bool {
    path.strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Drop any query string or fragment.
fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn is_well_formed(rule: &str) -> bool {
    rule.starts_with('/') && !rule.contains(['?', '#'])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::User;

    fn user(is_admin: bool) -> User {
        serde_json::from_value(serde_json::json!({
            "id": "u1",
            "username": "anna",
            "isAdmin": is_admin
        }))
        .unwrap()
    }

    fn anonymous() -> Session {
        Session::anonymous()
    }

    fn signed_in() -> Session {
        Session {
            user: Some(user(false)),
            app_config: None,
        }
    }

    fn admin() -> Session {
        Session {
            user: Some(user(true)),
            app_config: None,
        }
    }

    fn redirect(target: &str) -> NavigationDecision {
        NavigationDecision::RedirectTo(target.to_string())
    }

    #[test]
    fn test_classification() {
        let rules = RouteRules::default();

        assert_eq!(rules.classify("/login"), PathClass::UnauthenticatedOnly);
        assert_eq!(rules.classify("/login/alternative"), PathClass::UnauthenticatedOnly);
        assert_eq!(rules.classify("/lc"), PathClass::UnauthenticatedOnly);
        assert_eq!(rules.classify("/lc/abc123"), PathClass::UnauthenticatedOnly);
        assert_eq!(rules.classify("/authorize"), PathClass::Public);
        assert_eq!(rules.classify("/device"), PathClass::Public);
        assert_eq!(rules.classify("/health"), PathClass::Public);
        assert_eq!(rules.classify("/healthz"), PathClass::Public);
        assert_eq!(rules.classify("/settings/admin"), PathClass::AdminOnly);
        assert_eq!(rules.classify("/settings/admin/users"), PathClass::AdminOnly);
        assert_eq!(rules.classify("/settings"), PathClass::Protected);
        assert_eq!(rules.classify("/settings/account"), PathClass::Protected);
        assert_eq!(rules.classify("/"), PathClass::Protected);
    }

    #[test]
    fn test_classification_is_by_segment_not_substring() {
        let rules = RouteRules::default();

        assert_eq!(rules.classify("/loginx"), PathClass::Protected);
        assert_eq!(rules.classify("/lcd"), PathClass::Protected);
        assert_eq!(rules.classify("/settings/administrator"), PathClass::Protected);
        assert_eq!(rules.classify("/api/login"), PathClass::Protected);
        // Public paths are exact
        assert_eq!(rules.classify("/authorize/callback"), PathClass::Protected);
    }

    #[test]
    fn test_classification_ignores_query_and_fragment() {
        let rules = RouteRules::default();

        assert_eq!(
            rules.classify("/authorize?client_id=abc&scope=openid"),
            PathClass::Public
        );
        assert_eq!(rules.classify("/login#passkey"), PathClass::UnauthenticatedOnly);
        assert_eq!(rules.classify("/settings/admin?page=2"), PathClass::AdminOnly);
    }

    #[test]
    fn test_malformed_paths_are_protected() {
        let rules = RouteRules::default();

        assert_eq!(rules.classify(""), PathClass::Protected);
        assert_eq!(rules.classify("login"), PathClass::Protected);
        assert_eq!(rules.classify("//login"), PathClass::Protected);
        assert_eq!(rules.classify("?x=/login"), PathClass::Protected);
    }

    #[test]
    fn test_unauthenticated_only_paths() {
        let guard = RouteGuard::default();

        assert_eq!(guard.decide("/login", &anonymous()), NavigationDecision::Allow);
        assert_eq!(guard.decide("/login", &signed_in()), redirect("/settings"));
        assert_eq!(guard.decide("/lc/code", &admin()), redirect("/settings"));
    }

    #[test]
    fn test_public_paths() {
        let guard = RouteGuard::default();

        for session in [anonymous(), signed_in(), admin()] {
            assert_eq!(guard.decide("/authorize", &session), NavigationDecision::Allow);
            assert_eq!(guard.decide("/device", &session), NavigationDecision::Allow);
            assert_eq!(guard.decide("/healthz", &session), NavigationDecision::Allow);
        }
    }

    #[test]
    fn test_admin_paths() {
        let guard = RouteGuard::default();

        assert_eq!(
            guard.decide("/settings/admin", &signed_in()),
            redirect("/settings")
        );
        assert_eq!(
            guard.decide("/settings/admin", &admin()),
            NavigationDecision::Allow
        );
        assert_eq!(
            guard.decide("/settings/admin", &anonymous()),
            redirect("/login")
        );
        assert_eq!(
            guard.decide("/settings/admin/oidc-clients", &admin()),
            NavigationDecision::Allow
        );
    }

    #[test]
    fn test_protected_paths() {
        let guard = RouteGuard::default();

        assert_eq!(guard.decide("/settings", &signed_in()), NavigationDecision::Allow);
        assert_eq!(guard.decide("/settings", &anonymous()), redirect("/login"));
        assert_eq!(guard.decide("/", &anonymous()), redirect("/login"));
    }

    #[test]
    fn test_config_presence_does_not_matter() {
        let guard = RouteGuard::default();
        let session = Session {
            user: Some(user(false)),
            app_config: Some(Default::default()),
        };

        assert_eq!(guard.decide("/settings", &session), NavigationDecision::Allow);
    }

    #[test]
    fn test_every_class_and_session_combination_is_decided() {
        let guard = RouteGuard::default();
        let classes = [
            PathClass::UnauthenticatedOnly,
            PathClass::Public,
            PathClass::AdminOnly,
            PathClass::Protected,
        ];

        for class in classes {
            for session in [anonymous(), signed_in(), admin()] {
                match guard.decide_classified(class, &session) {
                    NavigationDecision::Allow => {}
                    NavigationDecision::RedirectTo(target) => {
                        // Redirect targets never redirect again for the same session
                        assert_eq!(
                            guard.decide(&target, &session),
                            NavigationDecision::Allow,
                            "class {:?} redirects to {} which is not allowed",
                            class,
                            target
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_builder_extends_defaults() {
        let rules = RouteRules::builder()
            .public("/.well-known/openid-configuration")
            .unauthenticated_only("/signup")
            .admin_only("/settings/audit-log/global")
            .build()
            .unwrap();

        assert_eq!(
            rules.classify("/.well-known/openid-configuration"),
            PathClass::Public
        );
        assert_eq!(rules.classify("/signup/token"), PathClass::UnauthenticatedOnly);
        assert_eq!(
            rules.classify("/settings/audit-log/global"),
            PathClass::AdminOnly
        );
        // Defaults still present
        assert_eq!(rules.classify("/login"), PathClass::UnauthenticatedOnly);
    }

    #[test]
    fn test_builder_rejects_public_inside_prefix() {
        let result = RouteRules::builder().public("/login/help").build();

        assert_eq!(
            result,
            Err(RuleConflict::Overlap(
                "/login".to_string(),
                "/login/help".to_string()
            ))
        );
    }

    #[test]
    fn test_builder_rejects_nested_prefix_families() {
        let result = RouteRules::builder().unauthenticated_only("/settings").build();

        assert!(matches!(result, Err(RuleConflict::Overlap(_, _))));
    }

    #[test]
    fn test_builder_rejects_malformed_rules() {
        assert_eq!(
            RouteRules::builder().admin_only("settings").build(),
            Err(RuleConflict::InvalidRule("settings".to_string()))
        );
        assert_eq!(
            RouteRules::builder().unauthenticated_only("/").build(),
            Err(RuleConflict::InvalidRule("/".to_string()))
        );
        assert_eq!(
            RouteRules::builder().public("/device?x=1").build(),
            Err(RuleConflict::InvalidRule("/device?x=1".to_string()))
        );
    }

    #[test]
    fn test_builder_rejects_redirect_loops() {
        assert_eq!(
            RouteRules::builder().login_path("/signin").build(),
            Err(RuleConflict::RedirectLoop("/signin".to_string()))
        );
        assert_eq!(
            RouteRules::builder()
                .landing_path("/settings/admin/users")
                .build(),
            Err(RuleConflict::RedirectLoop("/settings/admin/users".to_string()))
        );
    }

    #[test]
    fn test_builder_custom_login_path() {
        let rules = RouteRules::builder()
            .unauthenticated_only("/signin")
            .login_path("/signin")
            .build()
            .unwrap();
        let guard = RouteGuard::new(rules);

        assert_eq!(guard.decide("/settings", &anonymous()), redirect("/signin"));
    }
}
