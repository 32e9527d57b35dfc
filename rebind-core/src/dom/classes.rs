//! Class-list helper and attribute carry-over.

use super::node::Node;

/// Class-list view over an element's `class` attribute.
pub struct ClassList<'a> {
    node: &'a Node,
}

/// Borrow the class list of `node`.
pub fn classes(node: &Node) -> ClassList<'_> {
    ClassList { node }
}

impl<'a> ClassList<'a> {
    pub fn to_vec(&self) -> Vec<String> {
        self.node
            .attribute("class")
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    fn write(&self, list: &[String]) {
        self.node.set_attribute("class", list.join(" "));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.to_vec().iter().any(|c| c == name)
    }

    pub fn add(&self, name: &str) -> &Self {
        let mut list = self.to_vec();
        if !list.iter().any(|c| c == name) {
            list.push(name.to_string());
            self.write(&list);
        }
        self
    }

    pub fn remove(&self, name: &str) -> &Self {
        let mut list = self.to_vec();
        let before = list.len();
        list.retain(|c| c != name);
        if list.len() != before {
            self.write(&list);
        }
        self
    }

    /// Flip `name`; returns whether it is present afterwards.
    pub fn toggle(&self, name: &str) -> bool {
        if self.contains(name) {
            self.remove(name);
            false
        } else {
            self.add(name);
            true
        }
    }
}

/// Carry attributes and classes from `original` over to `replacement`.
///
/// Attributes the replacement already has, and `id`/`class`, are left alone;
/// class lists are merged without duplicates, replacement classes first.
pub fn carry(replacement: &Node, original: &Node) -> Node {
    for (name, value) in original.attributes() {
        if name == "class" || name == "id" || replacement.has_attribute(&name) {
            continue;
        }
        replacement.set_attribute(&name, value);
    }

    if replacement.attribute("class") != original.attribute("class") {
        let mut merged = classes(replacement).to_vec();
        for class in classes(original).to_vec() {
            if !merged.contains(&class) {
                merged.push(class);
            }
        }
        replacement.set_attribute("class", merged.join(" "));
    }

    replacement.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_chain() {
        let el = Node::element("div");
        classes(&el).add("visible").remove("hidden");
        assert!(classes(&el).contains("visible"));
        assert!(!classes(&el).contains("hidden"));

        classes(&el).remove("visible").add("hidden");
        assert_eq!(classes(&el).to_vec(), vec!["hidden"]);
    }

    #[test]
    fn add_is_idempotent() {
        let el = Node::element("div");
        el.set_attribute("class", "a  b");
        classes(&el).add("a").add("c");
        assert_eq!(el.attribute("class").as_deref(), Some("a b c"));
    }

    #[test]
    fn toggle_flips() {
        let el = Node::element("div");
        assert!(classes(&el).toggle("open"));
        assert!(!classes(&el).toggle("open"));
        assert!(!classes(&el).contains("open"));
    }

    #[test]
    fn carry_merges_attributes_and_classes() {
        let original = Node::element("div");
        original.set_attribute("id", "old");
        original.set_attribute("title", "kept");
        original.set_attribute("class", "a b");

        let replacement = Node::element("section");
        replacement.set_attribute("title", "mine");
        replacement.set_attribute("class", "b c");

        let out = carry(&replacement, &original);
        assert_eq!(out, replacement);
        assert_eq!(out.attribute("title").as_deref(), Some("mine"));
        assert!(!out.has_attribute("id"));
        assert_eq!(out.attribute("class").as_deref(), Some("b c a"));
    }
}
