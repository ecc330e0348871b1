/// A named set of route patterns together with the request paths looked up against them.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    routes: RouteSet,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, routes: RouteSet) -> Self {
        Self { name, group, routes }
    }

    pub fn small(name: &'static str, routes: RouteSet) -> Self {
        Self::new(name, TestGroup::Small, routes)
    }

    pub fn large(name: &'static str, routes: RouteSet) -> Self {
        Self::new(name, TestGroup::Large, routes)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn routes(&self) -> &RouteSet {
        &self.routes
    }
}

#[derive(Debug, Copy, Clone)]
pub struct RouteSet {
    patterns: &'static [&'static str],
    paths: &'static [&'static str],
}

impl RouteSet {
    pub const fn new(patterns: &'static [&'static str], paths: &'static [&'static str]) -> Self {
        Self { patterns, paths }
    }

    pub fn patterns(&self) -> &'static [&'static str] {
        self.patterns
    }

    pub fn paths(&self) -> &'static [&'static str] {
        self.paths
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}

pub static STATIC_ROUTES: RouteSet = RouteSet::new(
    &["/", "/about", "/contact", "/blog", "/blog/archive", "/docs", "/docs/install", "/docs/config"],
    &["/", "/blog/archive", "/docs/config", "/missing"],
);

pub static GITHUB_ROUTES: RouteSet = RouteSet::new(
    &[
        "/authorizations",
        "/authorizations/:id",
        "/applications/:client_id/tokens/:access_token",
        "/events",
        "/repos/:owner/:repo/events",
        "/networks/:owner/:repo/events",
        "/orgs/:org/events",
        "/users/:user/received_events",
        "/users/:user/received_events/public",
        "/users/:user/events",
        "/users/:user/events/public",
        "/users/:user/events/orgs/:org",
        "/feeds",
        "/notifications",
        "/repos/:owner/:repo/notifications",
        "/notifications/threads/:id",
        "/notifications/threads/:id/subscription",
        "/repos/:owner/:repo/stargazers",
        "/users/:user/starred",
        "/user/starred",
        "/user/starred/:owner/:repo",
        "/repos/:owner/:repo/subscribers",
        "/users/:user/subscriptions",
        "/user/subscriptions",
        "/repos/:owner/:repo/subscription",
        "/user/subscriptions/:owner/:repo",
        "/users/:user/gists",
        "/gists",
        "/gists/:id",
        "/gists/:id/star",
        "/repos/:owner/:repo/git/blobs/:sha",
        "/repos/:owner/:repo/git/commits/:sha",
        "/repos/:owner/:repo/git/refs",
        "/repos/:owner/:repo/git/tags/:sha",
        "/repos/:owner/:repo/git/trees/:sha",
        "/issues",
        "/user/issues",
        "/orgs/:org/issues",
        "/repos/:owner/:repo/issues",
        "/repos/:owner/:repo/issues/:number",
        "/repos/:owner/:repo/assignees",
        "/repos/:owner/:repo/assignees/:assignee",
        "/repos/:owner/:repo/issues/:number/comments",
        "/repos/:owner/:repo/issues/:number/events",
        "/repos/:owner/:repo/labels",
        "/repos/:owner/:repo/labels/:name",
        "/repos/:owner/:repo/milestones",
        "/repos/:owner/:repo/milestones/:number",
        "/emojis",
        "/gitignore/templates",
        "/gitignore/templates/:name",
        "/meta",
        "/rate_limit",
        "/users/:user/orgs",
        "/user/orgs",
        "/orgs/:org",
        "/orgs/:org/members",
        "/orgs/:org/members/:user",
        "/orgs/:org/teams",
        "/teams/:id",
        "/teams/:id/members",
        "/teams/:id/repos",
        "/user/teams",
        "/repos/:owner/:repo/pulls",
        "/repos/:owner/:repo/pulls/:number",
        "/repos/:owner/:repo/pulls/:number/commits",
        "/repos/:owner/:repo/pulls/:number/files",
        "/repos/:owner/:repo/pulls/:number/merge",
        "/user/repos",
        "/users/:user/repos",
        "/orgs/:org/repos",
        "/repositories",
        "/repos/:owner/:repo",
        "/repos/:owner/:repo/contributors",
        "/repos/:owner/:repo/languages",
        "/repos/:owner/:repo/tags",
        "/repos/:owner/:repo/branches",
        "/repos/:owner/:repo/branches/:branch",
        "/repos/:owner/:repo/collaborators",
        "/repos/:owner/:repo/comments",
        "/repos/:owner/:repo/commits",
        "/repos/:owner/:repo/commits/:sha",
        "/repos/:owner/:repo/readme",
        "/repos/:owner/:repo/contents/*path",
        "/repos/:owner/:repo/keys",
        "/repos/:owner/:repo/keys/:id",
        "/repos/:owner/:repo/releases",
        "/repos/:owner/:repo/releases/:id",
        "/repos/:owner/:repo/stats/contributors",
        "/search/repositories",
        "/search/code",
        "/search/issues",
        "/search/users",
        "/users/:user",
        "/user",
        "/users",
        "/user/emails",
        "/users/:user/followers",
        "/user/followers",
        "/users/:user/following",
        "/user/following",
        "/user/following/:user",
        "/users/:user/following/:target_user",
        "/users/:user/keys",
        "/user/keys",
        "/user/keys/:id",
    ],
    &[
        "/authorizations/12",
        "/repos/foldright/lattice/events",
        "/users/zava/received_events/public",
        "/repos/foldright/lattice/git/commits/7a1f",
        "/repos/foldright/lattice/issues/42/comments",
        "/repos/foldright/lattice/contents/crates/tree/src/node.rs",
        "/search/code",
        "/user/following/zava",
        "/users/zava/following/octocat",
        "/repos/foldright/lattice/pulls/7/",
        "/orgs/foldright/unknown",
    ],
);
