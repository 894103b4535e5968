use std::path::{Path, PathBuf};
use include_dir::{include_dir, Dir};
use rocket::get;
use rocket::http::ContentType;

static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

/// Looks up an embedded file relative to the static root.
pub fn asset(path: &Path) -> Option<(ContentType, &'static [u8])> {
    let file = STATIC_DIR.get_file(path)?;
    let content_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ContentType::from_extension)
        .unwrap_or(ContentType::Binary);
    Some((content_type, file.contents()))
}

#[get("/images/<file..>")]
pub fn image(file: PathBuf) -> Option<(ContentType, &'static [u8])> {
    asset(&Path::new("images").join(file))
}
