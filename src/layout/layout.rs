use std::borrow::Cow;
use std::path::PathBuf;

use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, info};

use crate::filesystem::{FileType, FolderId};
use crate::manager::{FileManager, ManagerError};

pub const LAYOUT_FILE_NAME: &str = "layout.yaml";
const DEFAULT_ENCODING: &str = "utf-8";
const KIND_KEYS: [(&str, FileType); 4] = [
    ("folder", FileType::Folder),
    ("text", FileType::Text),
    ("image", FileType::Image),
    ("video", FileType::Video),
];

/// One node described by a layout file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutEntry {
    Folder {
        name: String,
        children: Vec<LayoutEntry>,
    },
    Text {
        name: String,
        size: u64,
        encoding: String,
        pages: u64,
    },
    Media {
        kind: FileType,
        name: String,
        size: u64,
        height: u64,
        width: u64,
    },
}

impl LayoutEntry {
    pub fn name(&self) -> &str {
        match self {
            LayoutEntry::Folder { name, .. }
            | LayoutEntry::Text { name, .. }
            | LayoutEntry::Media { name, .. } => name,
        }
    }
}

/// Tree description loaded from YAML, applied to a [`FileManager`] with
/// [`Layout::populate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    entries: Vec<LayoutEntry>,
}

impl Layout {
    pub async fn from_path(path: PathBuf) -> Result<Self, LayoutError> {
        debug!("Reading layout file: {}", path.display());
        let bytes = compio::fs::read(&path).await.context(ReadSnafu {
            file_path: path.display().to_string(),
        })?;
        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.display().to_string(),
        })?;
        debug!("Successfully read layout file: {} bytes", contents.len());
        contents.as_str().try_into()
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    /// Creates every described node below the manager's root.
    ///
    /// Returns the number of nodes created.
    pub fn populate(&self, manager: &mut FileManager) -> Result<usize, LayoutError> {
        let root = manager.root();
        let created = Self::populate_into(manager, root, &self.entries)?;
        info!("Populated {} nodes from layout", created);
        Ok(created)
    }

    fn populate_into(
        manager: &mut FileManager,
        parent: FolderId,
        entries: &[LayoutEntry],
    ) -> Result<usize, LayoutError> {
        let mut created = 0;
        for entry in entries {
            match entry {
                LayoutEntry::Folder { name, children } => {
                    let folder = manager
                        .new_folder_node(FileType::Folder, name.as_str())
                        .context(ManagerSnafu)?;
                    manager.add(parent, folder).context(ManagerSnafu)?;
                    created += 1 + Self::populate_into(manager, folder, children)?;
                }
                LayoutEntry::Text {
                    name,
                    size,
                    encoding,
                    pages,
                } => {
                    let file = manager
                        .new_text_file_node(
                            FileType::Text,
                            name.as_str(),
                            *size,
                            encoding.as_str(),
                            *pages,
                        )
                        .context(ManagerSnafu)?;
                    manager.add(parent, file).context(ManagerSnafu)?;
                    created += 1;
                }
                LayoutEntry::Media {
                    kind,
                    name,
                    size,
                    height,
                    width,
                } => {
                    let file = manager
                        .new_media_file_node(*kind, name.as_str(), *size, *height, *width)
                        .context(ManagerSnafu)?;
                    manager.add(parent, file).context(ManagerSnafu)?;
                    created += 1;
                }
            }
        }
        Ok(created)
    }

    fn parse_entries(items: &[Yaml], position: &str) -> Result<Vec<LayoutEntry>, LayoutError> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let position = format!("{position}[{index}]");
                let data = item
                    .as_mapping()
                    .context(InvalidEntrySnafu { position: &position })?;
                Self::parse_entry(data, position)
            })
            .collect()
    }

    fn parse_entry(
        data: &LinkedHashMap<Yaml, Yaml>,
        position: String,
    ) -> Result<LayoutEntry, LayoutError> {
        let mut kinds = KIND_KEYS
            .iter()
            .filter_map(|(key, kind)| data.get(&yaml_key(key)).map(|value| (*kind, value)));
        let (kind, name) = match (kinds.next(), kinds.next()) {
            (Some(found), None) => found,
            _ => return InvalidEntrySnafu { position }.fail(),
        };
        let name = name
            .as_str()
            .context(InvalidFieldSnafu {
                position: &position,
                field: "name",
            })?
            .to_string();

        let entry = match kind {
            FileType::Folder => {
                let children = match data.get(&yaml_key("children")) {
                    None => Vec::new(),
                    Some(Yaml::Value(Scalar::Null)) => Vec::new(),
                    Some(value) => {
                        let items = value.as_sequence().context(InvalidFieldSnafu {
                            position: &position,
                            field: "children",
                        })?;
                        Self::parse_entries(items, &format!("{position}.children"))?
                    }
                };
                LayoutEntry::Folder { name, children }
            }
            FileType::Text => LayoutEntry::Text {
                name,
                size: number(data, &position, "size")?,
                encoding: match data.get(&yaml_key("encoding")) {
                    None => DEFAULT_ENCODING.to_string(),
                    Some(value) => value
                        .as_str()
                        .context(InvalidFieldSnafu {
                            position: &position,
                            field: "encoding",
                        })?
                        .to_string(),
                },
                pages: number(data, &position, "pages")?,
            },
            FileType::Image | FileType::Video => LayoutEntry::Media {
                kind,
                name,
                size: number(data, &position, "size")?,
                height: number(data, &position, "height")?,
                width: number(data, &position, "width")?,
            },
        };
        Ok(entry)
    }
}

fn yaml_key(name: &str) -> Yaml<'_> {
    Yaml::Value(Scalar::String(Cow::Borrowed(name)))
}

/// Reads an optional non-negative integer field, defaulting to zero.
fn number(
    data: &LinkedHashMap<Yaml, Yaml>,
    position: &str,
    field: &'static str,
) -> Result<u64, LayoutError> {
    match data.get(&yaml_key(field)) {
        None => Ok(0),
        Some(Yaml::Value(Scalar::Integer(n))) => {
            u64::try_from(*n).ok().context(InvalidFieldSnafu { position, field })
        }
        Some(_) => InvalidFieldSnafu { position, field }.fail(),
    }
}

impl TryFrom<&str> for Layout {
    type Error = LayoutError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let document = documents.first().context(MalformedLayoutSnafu)?;
        let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;

        let entries = match top_level.get(&yaml_key("tree")) {
            None => Vec::new(),
            Some(Yaml::Value(Scalar::Null)) => Vec::new(),
            Some(value) => {
                let items = value.as_sequence().context(TreeNotSequenceSnafu)?;
                Self::parse_entries(items, "tree")?
            }
        };
        debug!("Parsed {} top level layout entries", entries.len());

        Ok(Layout { entries })
    }
}

#[derive(Debug, Snafu)]
pub enum LayoutError {
    #[snafu(display("Failed to read the layout file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Layout file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the layout file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted layout file"))]
    MalformedLayout,
    #[snafu(display("Top level of the layout should be a map"))]
    TopLevelNotMap,
    #[snafu(display("The 'tree' section should be a list"))]
    TreeNotSequence,
    #[snafu(display(
        "Layout entry {} should be a map with exactly one of folder, text, image or video",
        position
    ))]
    InvalidEntry { position: String },
    #[snafu(display("Layout entry {} has an invalid '{}' field", position, field))]
    InvalidField {
        position: String,
        field: &'static str,
    },
    #[snafu(display("Failed to build the tree from the layout"))]
    Manager { source: ManagerError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::TreeError;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
tree:
  - folder: docs
    children:
      - text: report.txt
        size: 2048
        encoding: latin-1
        pages: 3
      - folder: pics
        children:
          - image: cat.png
            size: 10
            height: 600
            width: 800
  - video: clip.mp4
    size: 100
  - folder: empty
"#;

    fn parse(contents: &str) -> Result<Layout, LayoutError> {
        contents.try_into()
    }

    #[test]
    fn parses_nested_entries() {
        let layout = parse(SAMPLE).unwrap();

        assert_eq!(layout.entries().len(), 3);
        let LayoutEntry::Folder { name, children } = &layout.entries()[0] else {
            panic!("Expected a folder");
        };
        assert_eq!(name, "docs");
        assert_eq!(
            children[0],
            LayoutEntry::Text {
                name: "report.txt".into(),
                size: 2048,
                encoding: "latin-1".into(),
                pages: 3,
            }
        );
        assert_eq!(
            layout.entries()[1],
            LayoutEntry::Media {
                kind: FileType::Video,
                name: "clip.mp4".into(),
                size: 100,
                height: 0,
                width: 0,
            }
        );
        assert_eq!(layout.entries()[2].name(), "empty");
    }

    #[test]
    fn text_defaults_to_utf8() {
        let layout = parse("tree:\n  - text: a.txt").unwrap();
        assert!(matches!(
            &layout.entries()[0],
            LayoutEntry::Text { encoding, size: 0, pages: 0, .. } if encoding == "utf-8"
        ));
    }

    #[test]
    fn populate_builds_the_tree() {
        let layout = parse(SAMPLE).unwrap();
        let mut manager = FileManager::new();

        let created = layout.populate(&mut manager).unwrap();

        assert_eq!(created, 6);
        let root = manager.root();
        assert_eq!(manager.file_amount(root).unwrap(), 3);
        assert_eq!(manager.image_file_amount(root).unwrap(), 1);
        let cat = manager.resolve("/docs/pics/cat.png").unwrap();
        assert_eq!(manager.node(cat).unwrap().file_type(), FileType::Image);
    }

    #[rstest]
    #[case::slash("tree:\n  - text: a/b.txt", "a/b.txt")]
    #[case::empty("tree:\n  - folder: ''", "")]
    #[case::nested("tree:\n  - folder: d\n    children:\n      - image: x/y.png", "x/y.png")]
    fn populate_rejects_names_spanning_segments(#[case] contents: &str, #[case] expected: &str) {
        let layout = parse(contents).unwrap();
        let mut manager = FileManager::new();

        match layout.populate(&mut manager) {
            Err(LayoutError::Manager {
                source: ManagerError::InvalidName { name },
            }) => assert_eq!(name, expected),
            other => panic!("Expected InvalidName, got {other:?}"),
        }
    }

    #[test]
    fn populate_rejects_duplicate_siblings() {
        let layout = parse("tree:\n  - text: a.txt\n  - image: a.txt").unwrap();
        let mut manager = FileManager::new();

        let result = layout.populate(&mut manager);

        assert!(matches!(
            result,
            Err(LayoutError::Manager {
                source: ManagerError::Structure {
                    source: TreeError::NameTaken { .. }
                }
            })
        ));
    }

    #[test]
    fn empty_file_is_malformed() {
        assert!(matches!(parse(""), Err(LayoutError::MalformedLayout)));
    }

    #[rstest]
    #[case::list("- a\n- b")]
    #[case::scalar("just a string")]
    fn top_level_must_be_map(#[case] contents: &str) {
        assert!(matches!(parse(contents), Err(LayoutError::TopLevelNotMap)));
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        assert!(matches!(
            parse("invalid: yaml: content: [unclosed"),
            Err(LayoutError::ParseError { .. })
        ));
    }

    #[test]
    fn tree_must_be_a_list() {
        assert!(matches!(
            parse("tree:\n  docs: {}"),
            Err(LayoutError::TreeNotSequence)
        ));
    }

    #[test]
    fn missing_tree_section_is_empty_layout() {
        assert_eq!(parse("other: value").unwrap(), Layout::default());
    }

    #[rstest]
    #[case::no_kind("tree:\n  - size: 3", "tree[0]")]
    #[case::two_kinds("tree:\n  - text: a\n    image: b", "tree[0]")]
    #[case::not_a_map("tree:\n  - plain", "tree[0]")]
    #[case::nested("tree:\n  - folder: d\n    children:\n      - 12", "tree[0].children[0]")]
    fn malformed_entries_report_position(#[case] contents: &str, #[case] expected: &str) {
        match parse(contents) {
            Err(LayoutError::InvalidEntry { position }) => assert_eq!(position, expected),
            other => panic!("Expected InvalidEntry, got {other:?}"),
        }
    }

    #[rstest]
    #[case::negative("tree:\n  - image: a.png\n    size: -1", "size")]
    #[case::text_size("tree:\n  - text: a.txt\n    pages: many", "pages")]
    #[case::name_not_a_string("tree:\n  - text: [a, b]", "name")]
    #[case::children("tree:\n  - folder: d\n    children: nope", "children")]
    fn invalid_fields_are_named(#[case] contents: &str, #[case] expected: &str) {
        match parse(contents) {
            Err(LayoutError::InvalidField { field, .. }) => assert_eq!(field, expected),
            other => panic!("Expected InvalidField, got {other:?}"),
        }
    }

    #[compio::test]
    async fn reads_layout_from_disk() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, "{SAMPLE}").expect("Failed to write layout");

        let layout = Layout::from_path(file.path().to_path_buf()).await.unwrap();

        assert_eq!(layout.entries().len(), 3);
    }

    #[compio::test]
    async fn missing_file_is_read_error() {
        let result = Layout::from_path(PathBuf::from("does/not/exist.yaml")).await;
        assert!(matches!(result, Err(LayoutError::ReadError { .. })));
    }
}
