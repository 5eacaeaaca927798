use super::*;

const DEJAVU_DIR: &str = "/usr/share/fonts/truetype/dejavu";

fn dejavu(name: &str) -> Option<Vec<u8>> {
    std::fs::read(Path::new(DEJAVU_DIR).join(name)).ok()
}

#[test]
fn class_tracks_face_content() {
    let a = LoadedFont::from_faces("Demo", FontFaces::regular_only(vec![1, 2, 3])).unwrap();
    let b = LoadedFont::from_faces("Demo", FontFaces::regular_only(vec![1, 2, 3])).unwrap();
    let c = LoadedFont::from_faces("Demo", FontFaces::regular_only(vec![1, 2, 4])).unwrap();
    assert_eq!(a.identity, b.identity);
    assert_ne!(a.class(), c.class());
    assert!(a.class().starts_with("Demo-"));
    assert_eq!(a.family(), "Demo");
}

#[test]
fn adding_a_style_face_changes_class() {
    let plain = LoadedFont::from_faces("Demo", FontFaces::regular_only(vec![9])).unwrap();
    let mut faces = FontFaces::regular_only(vec![9]);
    faces.bold = Some(FaceData::new(vec![9]));
    let with_bold = LoadedFont::from_faces("Demo", faces).unwrap();
    assert_ne!(plain.class(), with_bold.class());
}

#[test]
fn collection_index_changes_class() {
    let first = LoadedFont::from_faces("Demo", FontFaces::regular_only(vec![7])).unwrap();
    let mut faces = FontFaces::regular_only(vec![7]);
    faces.regular = FaceData::with_index(vec![7], 1);
    let second = LoadedFont::from_faces("Demo", faces).unwrap();
    assert_ne!(first.class(), second.class());
}

#[test]
fn empty_inputs_are_font_errors() {
    assert!(matches!(
        LoadedFont::from_faces("", FontFaces::regular_only(vec![1])),
        Err(SlidecastError::Font(_))
    ));
    assert!(matches!(
        LoadedFont::from_faces("Demo", FontFaces::regular_only(Vec::new())),
        Err(SlidecastError::Font(_))
    ));
}

#[test]
fn family_resolves_by_name_table_not_file_name() {
    let Some(regular) = dejavu("DejaVuSans.ttf") else {
        return;
    };
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("dv.ttf"), &regular).unwrap();

    let mut fonts = FontDir::new();
    fonts.load_dir(tmp.path());
    assert!(fonts.face_count() >= 1);

    let font = fonts.load("dejavu sans").unwrap();
    assert_eq!(font.family(), "DejaVu Sans");
    assert_eq!(font.faces.regular.bytes.as_slice(), regular.as_slice());
    assert_eq!(font.faces.regular.index, 0);
    assert!(fonts.load("DejaVuSans").is_err());
}

#[test]
fn missing_styles_are_left_for_synthesis() {
    let Some(regular) = dejavu("DejaVuSans.ttf") else {
        return;
    };
    let mut fonts = FontDir::new();
    fonts.load_data(regular);

    let font = fonts.load("DejaVu Sans").unwrap();
    assert!(font.faces.bold.is_none());
    assert!(font.faces.italic.is_none());
    assert!(font.faces.bold_italic.is_none());
}

#[test]
fn style_faces_are_picked_by_weight_and_slant() {
    let (Some(regular), Some(bold), Some(oblique)) = (
        dejavu("DejaVuSans.ttf"),
        dejavu("DejaVuSans-Bold.ttf"),
        dejavu("DejaVuSans-Oblique.ttf"),
    ) else {
        return;
    };
    let mut fonts = FontDir::new();
    fonts.load_data(oblique.clone());
    fonts.load_data(bold.clone());
    fonts.load_data(regular.clone());

    let font = fonts.load("DejaVu Sans").unwrap();
    assert_eq!(font.faces.regular.bytes.as_slice(), regular.as_slice());
    assert_eq!(
        font.faces.bold.as_ref().map(|f| f.bytes.as_slice()),
        Some(bold.as_slice())
    );
    assert_eq!(
        font.faces.italic.as_ref().map(|f| f.bytes.as_slice()),
        Some(oblique.as_slice())
    );
    assert!(font.faces.bold_italic.is_none());
}

#[test]
fn missing_family_is_a_font_error() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("Nope.ttf"), b"not a font").unwrap();

    let mut fonts = FontDir::new();
    fonts.load_dir(tmp.path());
    assert_eq!(fonts.face_count(), 0);

    let err = fonts.load("Nope").unwrap_err();
    assert!(matches!(err, SlidecastError::Font(_)));
    assert!(err.to_string().contains("Nope"));
}
