use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A folder with its children nested, for rendering the sidebar tree.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FolderNode {
    #[serde(flatten)]
    pub folder: Folder,
    pub children: Vec<FolderNode>,
}

/// Assembles flat folder rows into a forest rooted at parentless folders.
/// Rows whose parent is missing from the input are treated as roots rather
/// than dropped.
pub fn build_folder_tree(mut folders: Vec<Folder>) -> Vec<FolderNode> {
    folders.sort_by(|a, b| a.name.cmp(&b.name));

    let ids: std::collections::HashSet<Uuid> = folders.iter().map(|f| f.id).collect();
    let mut children_of: std::collections::HashMap<Uuid, Vec<Folder>> =
        std::collections::HashMap::new();
    let mut roots = Vec::new();

    for folder in folders {
        match folder.parent_id {
            Some(parent) if ids.contains(&parent) => {
                children_of.entry(parent).or_default().push(folder)
            }
            _ => roots.push(folder),
        }
    }

    fn attach(
        folder: Folder,
        children_of: &mut std::collections::HashMap<Uuid, Vec<Folder>>,
    ) -> FolderNode {
        let children = children_of
            .remove(&folder.id)
            .unwrap_or_default()
            .into_iter()
            .map(|child| attach(child, children_of))
            .collect();
        FolderNode { folder, children }
    }

    roots
        .into_iter()
        .map(|folder| attach(folder, &mut children_of))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(name: &str, parent_id: Option<Uuid>) -> Folder {
        Folder {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_id,
            owner_id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn nests_children_under_parents() {
        let root = folder("Semester 1", None);
        let child = folder("Algorithms", Some(root.id));
        let grandchild = folder("Homework", Some(child.id));

        let tree = build_folder_tree(vec![grandchild, root.clone(), child.clone()]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].folder.id, root.id);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].folder.id, child.id);
        assert_eq!(tree[0].children[0].children.len(), 1);
        assert_eq!(tree[0].children[0].children[0].folder.name, "Homework");
    }

    #[test]
    fn orphaned_folder_becomes_root() {
        let orphan = folder("Lost", Some(Uuid::new_v4()));
        let tree = build_folder_tree(vec![orphan]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].folder.name, "Lost");
    }

    #[test]
    fn siblings_sorted_by_name() {
        let root = folder("Root", None);
        let b = folder("Biology", Some(root.id));
        let a = folder("Algebra", Some(root.id));

        let tree = build_folder_tree(vec![root, b, a]);
        let names: Vec<&str> = tree[0]
            .children
            .iter()
            .map(|c| c.folder.name.as_str())
            .collect();
        assert_eq!(names, vec!["Algebra", "Biology"]);
    }
}
