use folder_slideshow::config::Configuration;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

fn parse(yaml: &str) -> Configuration {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn parses_kebab_case_keys_and_humantime() {
    let cfg = parse(
        r#"
screen-id: 1
folder-path: "/srv/frames"
display-duration: 5s
prompt-lines: 2
ticks-per-second: 10
caption-font-family: "DejaVu Sans"
"#,
    );
    assert_eq!(cfg.screen_id, 1);
    assert_eq!(cfg.folder_path, PathBuf::from("/srv/frames"));
    assert_eq!(cfg.display_duration, Duration::from_secs(5));
    assert_eq!(cfg.prompt_lines, 2);
    assert_eq!(cfg.ticks_per_image(), 50);
    assert_eq!(cfg.caption_font_family.as_deref(), Some("DejaVu Sans"));
    assert!(cfg.validated().is_ok());
}

#[test]
fn missing_keys_fall_back_to_defaults() {
    let cfg = parse("folder-path: /tmp/photos\n");
    assert_eq!(cfg.screen_id, 0);
    assert_eq!(cfg.display_duration, Duration::from_secs(3));
    assert_eq!(cfg.prompt_lines, 3);
    assert_eq!(cfg.ticks_per_second, 20);
    assert_eq!(cfg.caption_wrap_width, 63);
    assert_eq!(cfg.ticks_per_image(), 60);
    assert_eq!(cfg.tick_interval(), Duration::from_millis(50));
}

#[test]
fn rejects_zero_duration_and_missing_folder() {
    let cfg = parse("folder-path: /tmp/photos\ndisplay-duration: 0s\n");
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("display-duration"));

    let cfg = parse("display-duration: 2s\n");
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("folder-path"));
}

#[test]
fn rejects_out_of_range_tick_rate() {
    let cfg = parse("folder-path: /tmp/photos\nticks-per-second: 0\n");
    assert!(cfg.validated().is_err());
    let cfg = parse("folder-path: /tmp/photos\nticks-per-second: 5000\n");
    assert!(cfg.validated().is_err());
}

#[test]
fn loads_from_file() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    fs::write(&path, "folder-path: /var/images\ndisplay-duration: 1m\n").unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.folder_path, PathBuf::from("/var/images"));
    assert_eq!(cfg.display_duration, Duration::from_secs(60));
}

#[test]
fn unreadable_file_reports_path() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("absent.yaml");
    let err = Configuration::from_yaml_file(&path).unwrap_err();
    assert!(err.to_string().contains("absent.yaml"));
}
