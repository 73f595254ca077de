pub mod cff;
pub mod codegen;
mod error;
pub mod generator;
pub mod glyph;
pub mod model;
pub mod otf;
pub mod svg;
mod utils;

pub use error::Error;
pub use glyph::BuildOptions;
pub use model::{IconEntry, IconSource};

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::codegen::ModuleParams;
use crate::utils::{extract_hash, icon_set_hash};

/// Converts a directory of SVG icons into an OpenType (CFF2) font plus an
/// optional Rust module declaring the icon code points.
pub struct IconFont {
    icons_dir: PathBuf,
    font_file: PathBuf,
    class_file: Option<PathBuf>,

    class_name: String,
    font_name: String,
    indent: usize,
    normalize: bool,
    ignore_shapes: bool,
}

impl IconFont {
    pub fn builder(icons_dir: impl AsRef<Path>, font_file: impl AsRef<Path>) -> IconFont {
        let font_file = font_file.as_ref().to_path_buf();
        let font_name = font_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "Icons".to_string());

        IconFont {
            icons_dir: icons_dir.as_ref().to_path_buf(),
            font_file,
            class_file: None,
            class_name: "Icons".to_string(),
            font_name,
            indent: 2,
            normalize: true,
            ignore_shapes: true,
        }
    }

    pub fn set_class_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.class_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn set_class_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.class_name = name.into();
        self
    }

    pub fn set_font_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.font_name = name.into();
        self
    }

    pub fn set_indent(&mut self, indent: usize) -> &mut Self {
        self.indent = indent;
        self
    }

    pub fn set_normalize(&mut self, normalize: bool) -> &mut Self {
        self.normalize = normalize;
        self
    }

    pub fn set_ignore_shapes(&mut self, ignore_shapes: bool) -> &mut Self {
        self.ignore_shapes = ignore_shapes;
        self
    }

    /// Run the conversion, writing the font and the constants module.
    ///
    /// Regeneration is skipped when the output font exists and the
    /// constants module records the current icon-set hash.
    pub fn build(&mut self) -> Result<(), Error> {
        let icons = self.collect_icons()?;
        let hash = icon_set_hash(&icons);

        if self.up_to_date(&hash) {
            log::info!("{} is up to date", self.font_file.display());
            return Ok(());
        }

        let options = BuildOptions {
            normalize: self.normalize,
            ignore_shapes: self.ignore_shapes,
            ..BuildOptions::default()
        };
        let artifacts = generator::build_font(&self.font_name, &icons, &options)?;

        fs::write(&self.font_file, &artifacts.font)?;
        log::info!(
            "wrote {} ({} icons)",
            self.font_file.display(),
            artifacts.entries.len()
        );

        if let Some(class_file) = &self.class_file {
            let module = codegen::render_module(
                &ModuleParams {
                    class_name: &self.class_name,
                    font_name: &self.font_name,
                    indent: self.indent,
                    hash: &hash,
                },
                &artifacts.entries,
            )?;
            if let Some(parent) = class_file.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            fs::write(class_file, module)?;
            log::info!("wrote {}", class_file.display());
        }

        Ok(())
    }

    /// Gather `*.svg` files; the file stem becomes the icon name.
    fn collect_icons(&self) -> Result<Vec<IconSource>, Error> {
        let mut icons = Vec::new();
        for entry in fs::read_dir(&self.icons_dir)? {
            let path = entry?.path();
            if !path.is_file()
                || !path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
            {
                continue;
            }
            let Some(stem) = path.file_stem() else {
                continue;
            };
            icons.push(IconSource::new(
                stem.to_string_lossy(),
                fs::read_to_string(&path)?,
            ));
        }
        // Directory iteration order is platform-defined; the hash and the
        // code point assignment both need name order.
        icons.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(icons)
    }

    fn up_to_date(&self, hash: &str) -> bool {
        if !self.font_file.exists() {
            return false;
        }
        match &self.class_file {
            Some(class_file) => {
                matches!(extract_hash(class_file), Some(existing) if existing == hash)
            }
            // Without a recorded hash there is nothing to compare against.
            None => false,
        }
    }
}
