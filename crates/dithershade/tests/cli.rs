use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

fn dithershade(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dithershade"))
        .env("DITHERSHADE_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run dithershade")
}

fn png_dimensions(bytes: &[u8]) -> (u32, u32) {
    assert_eq!(bytes[..8], PNG_SIGNATURE);
    let width = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
    let height = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
    (width, height)
}

#[test]
fn still_writes_png_of_requested_size() {
    let root = TempDir::new().unwrap();
    let output = root.path().join("frame.png");

    let result = dithershade(
        root.path(),
        &[
            "--preset",
            "teal",
            "--size",
            "48x30",
            "still",
            "--time",
            "1.0",
            "--output",
            output.to_str().unwrap(),
        ],
    );

    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    let bytes = fs::read(&output).unwrap();
    assert_eq!(png_dimensions(&bytes), (48, 30));
}

#[test]
fn still_frames_change_over_time() {
    let root = TempDir::new().unwrap();
    let mut frames = Vec::new();
    for time in ["0", "1"] {
        let output = root.path().join(format!("t{time}.png"));
        let result = dithershade(
            root.path(),
            &[
                "still",
                "--size",
                "32x32",
                "--wave-color",
                "0.1,0.7,0.8",
                "--color-num",
                "4",
                "--pixel-size",
                "3",
                "--no-pointer",
                "--time",
                time,
                "--output",
                output.to_str().unwrap(),
            ],
        );
        assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
        frames.push(fs::read(&output).unwrap());
    }
    assert_ne!(frames[0], frames[1]);
}

#[test]
fn presets_lists_builtins_and_config_entries() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        r#"
version = 1

[defaults]
preset = "ember"

[presets.ember]
wave_color = [0.9, 0.3, 0.1]
color_num = 6
"#,
    )
    .unwrap();

    let result = dithershade(root.path(), &["presets"]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("portfolio"));
    assert!(stdout.contains("teal"));
    assert!(stdout.contains("* ember"));
    assert!(stdout.contains("bands=6"));
}

#[test]
fn invalid_config_is_rejected() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "version = 1\n[presets.bad]\nwave_amplitude = 2.0\n",
    )
    .unwrap();

    let result = dithershade(root.path(), &["presets"]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("wave_amplitude"));
}

#[test]
fn unknown_preset_fails() {
    let root = TempDir::new().unwrap();
    let output = root.path().join("frame.png");
    let result = dithershade(
        root.path(),
        &["--preset", "nope", "still", "--output", output.to_str().unwrap()],
    );
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("unknown preset 'nope'"));
    assert!(!output.exists());
}

#[test]
fn where_reports_config_dir() {
    let root = TempDir::new().unwrap();
    let result = dithershade(root.path(), &["where"]);
    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains(&root.path().display().to_string()));
    assert!(stdout.contains("missing"));
}
