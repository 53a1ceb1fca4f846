use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wirebean::prelude::*;

#[derive(Default, Bean)]
struct Cache {
    marker: Component,
}

#[derive(Default, Bean)]
struct TwoCaches {
    #[bean(name = "primary")]
    primary: Autowired<Cache>,
    #[bean(name = "replica")]
    replica: Autowired<Cache>,
}

#[test]
fn test_named_duplicates_coexist() {
    let app = Application::builder().root::<TwoCaches>().build().unwrap();

    let primary = app.named::<Cache>("primary").unwrap();
    let replica = app.named::<Cache>("replica").unwrap();
    assert!(!Arc::ptr_eq(&primary, &replica));

    let root = app.bean::<TwoCaches>().unwrap();
    let root = root.read().unwrap();
    assert!(root.primary.is(&primary));
    assert!(root.replica.is(&replica));

    assert!(matches!(
        app.bean::<Cache>(),
        Err(WireError::AmbiguousBean { .. })
    ));
}

#[derive(Default, Bean)]
struct UnnamedCaches {
    first: Autowired<Cache>,
    second: Autowired<Cache>,
}

#[test]
fn test_unnamed_duplicates_are_ambiguous() {
    let err = Application::builder()
        .root::<UnnamedCaches>()
        .build()
        .unwrap_err();
    assert!(err.is_wiring_error());
}

#[derive(Default, Bean)]
struct Node {
    marker: Component,
    next: Autowired<Node>,
}

#[test]
fn test_self_embedding_type_is_one_bean() {
    let app = Application::builder().root::<Node>().build().unwrap();
    assert_eq!(app.container().len(), 1);
    let node = app.bean::<Node>().unwrap();
    assert!(node.read().unwrap().next.is(&node));
}

#[derive(Default, Bean)]
struct Pool {
    marker: Component,
    size: i64,
    host: String,
}

#[derive(Default, Debug, PartialEq, Bean)]
struct UserRepository {
    marker: Repository,
    pool_size: i64,
}

#[derive(Default, Bean)]
#[bean(factory(method = "pool"))]
struct DbConfig {
    marker: Configuration,
    #[bean(value = "db.size", default = "4")]
    size: i64,
    #[bean(value = "db.host", default = "localhost")]
    host: Value<String>,
}

impl DbConfig {
    fn pool(&self) -> Pool {
        Pool {
            size: self.size,
            host: self.host.get(),
            ..Default::default()
        }
    }
}

#[derive(Default, Bean)]
#[bean(factory(method = "users", name = "users"))]
struct RepoConfig {
    marker: Configuration,
    pool: Autowired<Pool>,
}

impl RepoConfig {
    fn users(&self) -> UserRepository {
        UserRepository {
            pool_size: self.pool.read(|p| p.size).unwrap_or_default(),
            ..Default::default()
        }
    }
}

#[derive(Default, Bean)]
struct App {
    db: Autowired<DbConfig>,
    repos: Autowired<RepoConfig>,
    #[bean(name = "users")]
    users: Autowired<UserRepository>,
}

fn app(document: serde_json::Value) -> Application {
    Application::builder()
        .config_value(document)
        .root::<App>()
        .build()
        .unwrap()
}

#[test]
fn test_factory_results_are_beans() {
    let app = app(json!({"db": {"size": 8}}));

    let pool = app.bean::<Pool>().unwrap();
    assert_eq!(pool.read().unwrap().size, 8);
    assert_eq!(pool.read().unwrap().host, "localhost");

    let users = app.named::<UserRepository>("users").unwrap();
    assert_eq!(users.read().unwrap().pool_size, 8);
    assert_eq!(app.repositories().len(), 1);

    let root = app.bean::<App>().unwrap();
    assert!(root.read().unwrap().users.is(&users));
}

#[test]
fn test_reload_recalls_dependent_factories_once() {
    let app = app(json!({"db": {"size": 8, "host": "db-1"}}));
    let pool = app.bean::<Pool>().unwrap();
    let users = app.named::<UserRepository>("users").unwrap();

    let summary = app
        .reload_with(json!({"db": {"size": 32, "host": "db-2"}}))
        .unwrap();
    assert_eq!(
        summary.changed,
        vec!["db.host".to_string(), "db.size".to_string()]
    );
    assert_eq!(summary.recalled.len(), 2);
    assert!(summary.recalled[0].ends_with("DbConfig::pool"));
    assert!(summary.recalled[1].ends_with("RepoConfig::users"));

    assert_eq!(pool.read().unwrap().size, 32);
    assert_eq!(pool.read().unwrap().host, "db-2");
    assert_eq!(users.read().unwrap().pool_size, 32);
    assert!(Arc::ptr_eq(&pool, &app.bean::<Pool>().unwrap()));
}

#[test]
fn test_reload_is_idempotent() {
    let document = json!({"db": {"size": 8}});
    let app = app(document.clone());

    let summary = app.reload_with(document.clone()).unwrap();
    assert!(summary.is_empty());
    let summary = app.reload_with(document).unwrap();
    assert!(summary.is_empty());
    assert_eq!(app.bean::<Pool>().unwrap().read().unwrap().size, 8);
}

#[test]
fn test_default_to_explicit_same_value_is_not_a_change() {
    let app = app(json!({}));
    let summary = app.reload_with(json!({"db": {"size": 4}})).unwrap();
    assert!(summary.is_empty());
}

#[derive(Default, Bean)]
struct ReposFirst {
    repos: Autowired<RepoConfig>,
    db: Autowired<DbConfig>,
}

#[test]
fn test_factory_order_follows_dependencies_not_declaration() {
    let app = Application::builder()
        .config_value(json!({"db": {"size": 8}}))
        .root::<ReposFirst>()
        .build()
        .unwrap();
    let users = app.named::<UserRepository>("users").unwrap();
    assert_eq!(users.read().unwrap().pool_size, 8);

    let summary = app.reload_with(json!({"db": {"size": 32}})).unwrap();
    assert_eq!(summary.recalled.len(), 2);
    assert!(summary.recalled[0].ends_with("DbConfig::pool"));
    assert!(summary.recalled[1].ends_with("RepoConfig::users"));
    assert_eq!(app.bean::<Pool>().unwrap().read().unwrap().size, 32);
    assert_eq!(users.read().unwrap().pool_size, 32);
}

static CONNECTS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default, Bean)]
struct PostgresParameter {
    marker: Parameter,
    #[bean(value = "postgres.host", default = "localhost")]
    host: String,
    #[bean(value = "postgres.port", default = "5432")]
    port: i64,
}

#[derive(Default, Bean)]
struct Connection {
    url: String,
}

#[derive(Default, Bean)]
#[bean(factory(method = "connect"))]
struct PostgresConfig {
    marker: Configuration,
}

impl PostgresConfig {
    fn connect(&self, params: &PostgresParameter) -> Connection {
        CONNECTS.fetch_add(1, Ordering::SeqCst);
        Connection {
            url: format!("postgres://{}:{}", params.host, params.port),
        }
    }
}

#[test]
fn test_parameter_objects_feed_factories() {
    let app = Application::builder()
        .root::<PostgresConfig>()
        .build()
        .unwrap();
    assert!(app.bean::<PostgresParameter>().is_err());

    let connection = app.bean::<Connection>().unwrap();
    assert_eq!(connection.read().unwrap().url, "postgres://localhost:5432");
    assert_eq!(CONNECTS.load(Ordering::SeqCst), 1);

    let summary = app
        .reload_with(json!({"postgres": {"host": "pg", "port": 6543}}))
        .unwrap();
    assert_eq!(summary.changed.len(), 2);
    assert_eq!(summary.recalled.len(), 1);
    assert_eq!(CONNECTS.load(Ordering::SeqCst), 2);
    assert_eq!(connection.read().unwrap().url, "postgres://pg:6543");
}

#[derive(Default, Bean)]
#[bean(prefix = "/users")]
struct UserController {
    marker: Controller,
    #[bean(value = "app.port", default = "9090")]
    port: Value<i64>,
}

#[derive(Default, Bean)]
struct AuthMiddleware {
    marker: Middleware,
}

#[derive(Default, Bean)]
struct Models {
    marker: Entities,
    user: Autowired<UserRepository>,
    pool: Autowired<Pool>,
}

#[derive(Default, Bean)]
struct WebApp {
    users: Autowired<UserController>,
    #[bean(name = "admin", prefix = "/admin")]
    admin: Autowired<UserController>,
    #[bean(role = "middleware")]
    auth: Autowired<AuthMiddleware>,
    #[bean(role = "router")]
    tagged: Autowired<Cache>,
    models: Autowired<Models>,
}

#[test]
fn test_collaborator_views() {
    let app = Application::builder()
        .config_value(json!({"app": {"port": 8080}}))
        .root::<WebApp>()
        .build()
        .unwrap();

    let controllers = app.controllers();
    assert_eq!(controllers.len(), 2);
    assert_eq!(controllers[0].prefix.as_deref(), Some("/users"));
    assert_eq!(controllers[1].name, "admin");
    assert_eq!(controllers[1].prefix.as_deref(), Some("/admin"));
    assert!(controllers[0].is::<UserController>());

    let admin = controllers[1].downcast::<UserController>().unwrap();
    assert_eq!(admin.read().unwrap().port.get(), 8080);

    assert_eq!(app.middlewares().len(), 1);
    assert_eq!(app.beans_with_role(Role::Middleware).len(), 1);
    assert_eq!(app.routers().len(), 1);
    assert!(app.routers()[0].is::<Cache>());

    let entities: Vec<_> = app.entities().iter().map(|e| e.type_name).collect();
    assert_eq!(entities.len(), 2);
    assert!(entities[0].ends_with("UserRepository"));
    assert!(entities[1].ends_with("Pool"));
    assert!(app.bean::<UserRepository>().is_err());
}

#[derive(Default, Bean)]
struct Migrator {
    marker: Repository,
    tables: Vec<&'static str>,
}

#[derive(Default, Bean)]
#[bean(factory(method = "migrate"))]
struct OrmConfig {
    marker: Configuration,
}

impl OrmConfig {
    fn migrate(&self, entities: &EntityTypes) -> Migrator {
        Migrator {
            tables: entities.names(),
            ..Default::default()
        }
    }
}

#[derive(Default, Bean)]
struct OrmApp {
    orm: Autowired<OrmConfig>,
    models: Autowired<Models>,
}

#[test]
fn test_repository_factory_migrates_collected_entities() {
    let app = Application::builder().root::<OrmApp>().build().unwrap();

    let repositories = app.repositories();
    assert_eq!(repositories.len(), 1);
    let migrator = repositories[0].downcast::<Migrator>().unwrap();
    let tables = migrator.read().unwrap().tables.clone();
    assert_eq!(tables.len(), 2);
    assert!(tables[0].ends_with("UserRepository"));
    assert!(tables[1].ends_with("Pool"));
    assert_eq!(app.entities().len(), 2);
}
