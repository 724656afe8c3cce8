//! On-disk icon theme fixture.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Themes under `<tmp>/icons`, flat icons under `<tmp>/pixmaps`.
///
/// `Test` (16 and 48 px apps, inherits `Parent`), `Parent` (inherits
/// `Test` to form a cycle), `hicolor` (32 px apps) and `Other`.
pub struct ThemeFixture {
    pub dir: TempDir,
}

impl ThemeFixture {
    pub fn new() -> Self {
        init_logging();
        let fixture = Self {
            dir: tempfile::tempdir().expect("temp dir"),
        };

        fixture.theme(
            "Test",
            "Parent",
            &[("16x16/apps", 16, "Fixed"), ("48x48/apps", 48, "Fixed")],
        );
        fixture.theme("Parent", "Test", &[("24x24/places", 24, "Fixed")]);
        fixture.theme("hicolor", "", &[("32x32/apps", 32, "Threshold")]);
        fixture.theme("Other", "", &[("48x48/apps", 48, "Fixed")]);

        fixture.icon("Test/16x16/apps/editor.png", 16, 16);
        fixture.icon("Test/48x48/apps/editor.png", 48, 48);
        fixture.icon("Test/48x48/apps/wide.png", 48, 24);
        fixture.icon("Parent/24x24/places/folder.png", 24, 24);
        fixture.icon("hicolor/32x32/apps/terminal.png", 32, 32);
        fixture.icon("Other/48x48/apps/editor.png", 48, 48);
        fixture.icon("Test/48x48/apps/vector.svg", 0, 0);
        fixture.pixmap("legacy.png", 20, 20);
        fixture
    }

    pub fn icons(&self) -> PathBuf {
        self.dir.path().join("icons")
    }

    pub fn pixmaps(&self) -> PathBuf {
        self.dir.path().join("pixmaps")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.icons().join(relative)
    }

    fn theme(&self, id: &str, inherits: &str, directories: &[(&str, u32, &str)]) {
        let root = self.icons().join(id);
        let names: Vec<&str> = directories.iter().map(|(name, _, _)| *name).collect();
        let mut index = format!(
            "[Icon Theme]\nName={}\nInherits={}\nDirectories={}\n",
            id,
            inherits,
            names.join(",")
        );
        for (name, size, kind) in directories {
            index.push_str(&format!("\n[{}]\nSize={}\nType={}\n", name, size, kind));
            fs::create_dir_all(root.join(name)).unwrap();
        }
        fs::write(root.join("index.theme"), index).unwrap();
    }

    fn icon(&self, relative: &str, width: u32, height: u32) {
        write_image(&self.path(relative), width, height);
    }

    fn pixmap(&self, name: &str, width: u32, height: u32) {
        write_image(&self.pixmaps().join(name), width, height);
    }
}

/// A solid PNG; zero size writes a placeholder text file instead.
pub fn write_image(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    if width == 0 || height == 0 {
        fs::write(path, "<svg/>").unwrap();
        return;
    }
    RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
        .save(path)
        .unwrap();
}
