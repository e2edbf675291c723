//! Library-level tests of the registry against a real data directory
//!
//! Artifacts come from a mock HTTP server.

mod common;

use common::{temp_artifacts, xz};
use rpem::core::catalog::Catalog;
use rpem::core::model::ResourceKind;
use rpem::core::registry::Registry;
use rpem::infra::dirs::DataLayout;
use rpem::infra::download::DownloadManager;
use rpem::infra::fetch::ArtifactFetcher;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog(version: &str, firmware_url: &str) -> Catalog {
    Catalog::from_json(&format!(
        r#"{{
            "version": "{version}",
            "hardware": [
                {{"id": "board", "name": "Board", "qemu_arch": "arm", "qemu_args": "-M raspi2b"}}
            ],
            "os": [],
            "firmware": [
                {{"id": "uefi", "dl_link": "{firmware_url}"}}
            ]
        }}"#
    ))
    .unwrap()
}

fn open(dir: &TempDir, catalog: Catalog) -> Registry {
    Registry::load(
        DataLayout::new(dir.path()),
        catalog,
        ArtifactFetcher::new(DownloadManager::new()),
    )
    .unwrap()
}

async fn serve(server: &MockServer, route: &str, body: Vec<u8>, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(times)
        .mount(server)
        .await;
}

// ============================================
// Persistence
// ============================================

/// Test: entries and files survive reopening the data directory
#[tokio::test]
async fn test_state_survives_reload() {
    let server = MockServer::start().await;
    serve(&server, "/uefi.fd", b"firmware".to_vec(), 1).await;
    serve(&server, "/os.img.xz", xz(b"compressed os image"), 1).await;

    let dir = TempDir::new().unwrap();
    let firmware_url = format!("{}/uefi.fd", server.uri());
    let os_url = format!("{}/os.img.xz", server.uri());

    {
        let mut registry = open(&dir, catalog("1.0.0", &firmware_url));
        registry.create_hardware("mine", "Mine", "aarch64", "-m 1g").unwrap();
        registry
            .create_os("os", "OS", "", "uefi", &["board", "mine"], &os_url)
            .unwrap();
        let created = registry.create_image("Daily", "mine", "os", None).await.unwrap();
        assert_eq!(created.entry.id.as_str(), "os_mine_daily");
        assert_eq!(created.artifact.size, 19);
    }

    let registry = open(&dir, catalog("1.0.0", &firmware_url));
    assert!(registry.has_resource(ResourceKind::Hardware, "mine"));
    assert!(registry.has_resource(ResourceKind::Os, "os"));
    assert!(registry.has_resource(ResourceKind::Image, "os_mine_daily"));
    assert_eq!(registry.last_image().map(|id| id.as_str()), Some("os_mine_daily"));

    let image_file = registry.layout().image_path("os_mine_daily");
    assert_eq!(std::fs::read(&image_file).unwrap(), b"compressed os image");

    // The firmware is fetched on first use and the image is not fetched again
    let command = registry.get_qemu_cmd("os_mine_daily", None).await.unwrap();
    assert_eq!(command.program, "qemu-system-aarch64");
    assert_eq!(command.hardware_args, "-m 1g");
    assert!(registry.layout().firmware_path("uefi").is_file());

    assert!(temp_artifacts(&registry.layout().images_dir()).is_empty());
    assert!(temp_artifacts(&registry.layout().firmware_dir()).is_empty());
    assert!(temp_artifacts(dir.path()).is_empty());
}

/// Test: a missing image file is fetched again when the command is built
#[tokio::test]
async fn test_missing_image_file_is_refetched() {
    let server = MockServer::start().await;
    serve(&server, "/uefi.fd", b"firmware".to_vec(), 1).await;
    serve(&server, "/os.img", b"raw image".to_vec(), 2).await;

    let dir = TempDir::new().unwrap();
    let firmware_url = format!("{}/uefi.fd", server.uri());
    let os_url = format!("{}/os.img", server.uri());

    let mut registry = open(&dir, catalog("1.0.0", &firmware_url));
    registry
        .create_os("os", "OS", "", "uefi", &["board"], &os_url)
        .unwrap();
    registry.create_image("a", "board", "os", None).await.unwrap();

    let image_file = registry.layout().image_path("os_board_a");
    std::fs::remove_file(&image_file).unwrap();

    registry.get_qemu_cmd("os_board_a", None).await.unwrap();
    assert_eq!(std::fs::read(&image_file).unwrap(), b"raw image");
}

// ============================================
// Defaults
// ============================================

/// Test: a newer catalog replaces the defaults and keeps user data
#[tokio::test]
async fn test_update_defaults_to_newer_catalog() {
    let dir = TempDir::new().unwrap();
    let url = "https://example.com/uefi.fd";

    {
        let mut registry = open(&dir, catalog("1.0.0", url));
        registry.create_hardware("mine", "Mine", "arm", "").unwrap();
    }

    let newer = Catalog::from_json(&format!(
        r#"{{
            "version": "1.1.0",
            "hardware": [
                {{"id": "board2", "name": "Board 2", "qemu_arch": "arm", "qemu_args": ""}}
            ],
            "firmware": [
                {{"id": "uefi", "dl_link": "{url}"}}
            ]
        }}"#
    ))
    .unwrap();
    let mut registry = open(&dir, newer);
    let update = registry.update_defaults().unwrap();

    assert_eq!(update.previous_version, Some(semver::Version::new(1, 0, 0)));
    assert_eq!(update.version, semver::Version::new(1, 1, 0));
    assert!(registry.has_resource(ResourceKind::Hardware, "mine"));
    assert!(registry.has_resource(ResourceKind::Hardware, "board2"));
    assert!(!registry.has_resource(ResourceKind::Hardware, "board"));
}

/// Test: the shipped catalog seeds a consistent registry
#[test]
fn test_builtin_catalog_seeds_registry() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(&dir, Catalog::builtin().unwrap());

    assert!(registry.has_resource(ResourceKind::Hardware, "rpi4b"));
    assert!(registry.has_resource(ResourceKind::Os, "netbsd_aarch64"));
    assert!(registry.state().dangling_references().is_empty());

    let before = std::fs::read(registry.layout().state_file()).unwrap();
    let update = registry.update_defaults().unwrap();
    let after = std::fs::read(registry.layout().state_file()).unwrap();

    assert!(update.shadowed.is_empty());
    assert!(update.dangling.is_empty());
    assert_eq!(before, after);
}
