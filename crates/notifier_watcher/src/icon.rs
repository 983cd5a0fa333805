use std::path::{Path, PathBuf};

use crate::proxy::StatusNotifierItemProxy;

/// A decoded icon: tightly packed RGBA8, row-major, top-left origin,
/// straight (non-premultiplied) alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, R,G,B,A per pixel.
    pub data: Vec<u8>,
}

#[derive(thiserror::Error, Debug)]
pub enum IconError {
    #[error("loading icon from file {path:?}")]
    LoadFromFile {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decode an `IconPixmap`-style property value.
///
/// Only the first candidate is considered. Its bytes are packed 32-bit ARGB
/// words in network byte order, which on a little-endian host lays each
/// pixel out as A,R,G,B; the byte order is assumed fixed rather than
/// detected, so channels will come out swapped on host/protocol endianness
/// combinations that disagree with that assumption.
fn icon_from_pixmaps(pixmaps: Vec<(i32, i32, Vec<u8>)>) -> Option<Icon> {
    let (width, height, mut data) = pixmaps.into_iter().next()?;
    if width <= 0 || height <= 0 || data.len() != width as usize * height as usize * 4 {
        log::warn!("ignoring malformed pixmap candidate ({}x{}, {} bytes)", width, height, data.len());
        return None;
    }

    for px in data.chunks_exact_mut(4) {
        // A,R,G,B -> R,G,B,A
        let a = px[0];
        px.copy_within(1..4, 0);
        px[3] = a;
    }

    Some(Icon { width: width as u32, height: height as u32, data })
}

/// Load an icon file, normalized to RGBA8 regardless of the source image's
/// channel count (alpha defaults to opaque).
fn icon_from_file(path: &Path) -> std::result::Result<Icon, IconError> {
    let image = image::open(path)
        .map_err(|source| IconError::LoadFromFile { path: path.to_owned(), source })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(Icon { width, height, data: image.into_raw() })
}

/// The file to try for the theme-lookup half of the resolution procedure:
/// `{theme}/{name}.png` when a theme path is given, otherwise the bare icon
/// name interpreted as a path.
fn icon_path(theme_path: Option<String>, icon_name: Option<String>) -> Option<PathBuf> {
    match (theme_path, icon_name) {
        (Some(theme), Some(name)) => Some(PathBuf::from(format!("{}/{}.png", theme, name))),
        (None, Some(name)) => Some(PathBuf::from(name)),
        _ => None,
    }
}

/// Fetch the result of a property query, demoting every failure (transport
/// error, missing interface, unknown property) to "absent".
fn property_or_absent<T>(
    destination: &zbus::names::BusName<'_>,
    property: &str,
    res: zbus::Result<T>,
) -> Option<T> {
    match res {
        Ok(value) => Some(value),
        // A client that simply doesn't expose the property is not worth a log line.
        Err(zbus::Error::FDO(e))
            if matches!(*e, zbus::fdo::Error::UnknownProperty(_) | zbus::fdo::Error::InvalidArgs(_)) =>
        {
            None
        }
        Err(e) => {
            log::debug!("{}: fetching {}: {} (treating as absent)", destination, property, e);
            None
        }
    }
}

/// Resolve an item's icon, first from its `IconPixmap` property, then from
/// `IconThemePath` + `IconName`, then from `IconName` alone as a direct
/// path.
///
/// `None` means "no visual representation available" and is not an error;
/// every failure along the way degrades to trying the next source.
pub async fn load_icon(sni: &StatusNotifierItemProxy<'_>) -> Option<Icon> {
    let destination = sni.inner().destination();

    if let Some(pixmaps) = property_or_absent(destination, "IconPixmap", sni.icon_pixmap().await) {
        if let Some(icon) = icon_from_pixmaps(pixmaps) {
            return Some(icon);
        }
    }

    let theme_path = property_or_absent(destination, "IconThemePath", sni.icon_theme_path().await)
        .filter(|s| !s.is_empty());
    let icon_name = property_or_absent(destination, "IconName", sni.icon_name().await)
        .filter(|s| !s.is_empty());

    let path = match icon_path(theme_path, icon_name) {
        Some(path) => path,
        None => {
            log::debug!("{}: no icon properties to resolve", destination);
            return None;
        }
    };

    match icon_from_file(&path) {
        Ok(icon) => Some(icon),
        Err(e) => {
            log::warn!("{}: {}", destination, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pixmap_bytes_are_permuted_from_argb_to_rgba() {
        let pixmaps = vec![(2, 1, vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08])];

        let icon = icon_from_pixmaps(pixmaps).unwrap();
        assert_eq!(icon.width, 2);
        assert_eq!(icon.height, 1);
        assert_eq!(icon.data, vec![0x02, 0x03, 0x04, 0x01, 0x06, 0x07, 0x08, 0x05]);
    }

    #[test]
    fn only_the_first_pixmap_candidate_is_used() {
        let pixmaps = vec![(1, 1, vec![1, 2, 3, 4]), (1, 1, vec![9, 9, 9, 9])];

        let icon = icon_from_pixmaps(pixmaps).unwrap();
        assert_eq!(icon.data, vec![2, 3, 4, 1]);
    }

    #[test]
    fn malformed_pixmap_candidates_are_dropped() {
        assert_eq!(icon_from_pixmaps(vec![]), None);
        assert_eq!(icon_from_pixmaps(vec![(2, 2, vec![0; 3])]), None);
        assert_eq!(icon_from_pixmaps(vec![(0, 0, vec![])]), None);
        assert_eq!(icon_from_pixmaps(vec![(-1, 4, vec![0; 16])]), None);
    }

    #[test]
    fn theme_lookups_form_a_png_path() {
        let path = icon_path(Some("/t".into()), Some("app".into()));
        assert_eq!(path, Some(PathBuf::from("/t/app.png")));
    }

    #[test]
    fn a_bare_icon_name_is_a_path_of_its_own() {
        let path = icon_path(None, Some("/abs/path/icon.png".into()));
        assert_eq!(path, Some(PathBuf::from("/abs/path/icon.png")));
    }

    #[test]
    fn a_theme_without_a_name_resolves_nothing() {
        assert_eq!(icon_path(Some("/t".into()), None), None);
        assert_eq!(icon_path(None, None), None);
    }

    #[test]
    fn file_icons_are_forced_to_rgba() {
        let path = std::env::temp_dir().join("notifier_watcher_rgb_icon_test.png");
        image::RgbImage::from_raw(2, 1, vec![10, 20, 30, 40, 50, 60]).unwrap().save(&path).unwrap();

        let icon = icon_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((icon.width, icon.height), (2, 1));
        assert_eq!(icon.data, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn a_missing_file_is_an_error() {
        let err = icon_from_file(Path::new("/t/app.png")).unwrap_err();
        assert!(matches!(err, IconError::LoadFromFile { .. }));
    }
}
