use crate::cli::{resolve_routes, Cli, Commands};
use crate::demo::demo_registry;
use clap::Parser;

#[test]
fn test_serve_flags() {
    let cli = Cli::try_parse_from([
        "laneway",
        "serve",
        "--port",
        "9000",
        "--cpu-workers",
        "2",
        "--manifest",
        "routes.yaml",
    ])
    .unwrap();

    match cli.command {
        Commands::Serve {
            port,
            cpu_workers,
            host,
            config,
            routes,
        } => {
            assert_eq!(port, Some(9000));
            assert_eq!(cpu_workers, Some(2));
            assert!(host.is_none());
            assert!(config.is_none());
            assert_eq!(routes.manifest.unwrap().to_string_lossy(), "routes.yaml");
        }
        Commands::Routes { .. } => panic!("Expected Serve command"),
    }
}

#[test]
fn test_routes_without_manifest() {
    let cli = Cli::try_parse_from(["laneway", "routes"]).unwrap();
    assert!(matches!(cli.command, Commands::Routes { ref routes } if routes.manifest.is_none()));
}

#[test]
fn test_resolve_default_routes() {
    let routes = resolve_routes(None, &demo_registry()).unwrap();
    assert!(routes.iter().any(|r| r.path_pattern == "/users/{id}"));
}

#[test]
fn test_missing_manifest_file_is_error() {
    let err = resolve_routes(Some("/definitely/not/here.yaml".as_ref()), &demo_registry()).unwrap_err();
    assert!(format!("{err:#}").contains("not/here.yaml"));
}
