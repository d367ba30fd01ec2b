use colored::Colorize;
use patty::filesystem::{FileData, Node, NodeId, NodeKind};
use patty::manager::{FileManager, ManagerError};

/// One line describing `node`: folders in bold blue, files with their metadata.
pub fn describe(node: &Node) -> String {
    match node.kind() {
        NodeKind::Folder { children } => format!(
            "{} {}",
            node.name().blue().bold(),
            format!("({} entries)", children.len()).dimmed()
        ),
        NodeKind::File(data) => format!("{} {}", node.name(), details(data).dimmed()),
    }
}

fn details(data: &FileData) -> String {
    match data {
        FileData::Text(text) => format!(
            "[text, {} bytes, {}, {} pages]",
            text.size, text.encoding, text.page_count
        ),
        FileData::Image(media) | FileData::Video(media) => format!(
            "[{}, {} bytes, {}x{}]",
            data.file_type(),
            media.size,
            media.width,
            media.height
        ),
    }
}

/// Indented pre-order rendering of the subtree at `start`.
pub fn render_tree(manager: &FileManager, start: NodeId) -> Result<Vec<String>, ManagerError> {
    manager.fold(start, Vec::new(), |_: &Node| true, |lines, visit| {
        lines.push(format!("{}{}", "  ".repeat(visit.depth), describe(visit.node)));
    })
}
