use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

pub type NodeId = usize;

/// Minimal view of a rendered page, implemented by the embedder. The scanner
/// only queries elements, reads text, tags elements with attributes and
/// toggles the blocked visual state. The attached block control carries the
/// channel name; the embedder wires its activation to an
/// `add_blocked_channel` request.
pub trait PageSurface: Send + Sync {
    /// All elements matching an element-type selector, in document order.
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// Text content of the first descendant of `node` matching `selector`.
    fn query_text(&self, node: NodeId, selector: &str) -> Option<String>;

    /// Nearest ancestor-or-self matching any of `selectors`.
    fn closest(&self, node: NodeId, selectors: &[&str]) -> Option<NodeId>;

    fn attr(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attr(&self, node: NodeId, name: &str, value: &str);

    /// Applies or clears the dimmed/overlaid non-interactive state.
    fn set_blocked(&self, node: NodeId, blocked: bool);

    fn attach_block_control(&self, node: NodeId, channel: &str);
    fn has_block_control(&self, node: NodeId) -> bool;
}

/// Compound selector in the small subset the candidate lists use:
/// `tag`, `#id`, `.class`, `tag.class`, `#id.class`, `[id="x"]`.
#[derive(Debug, Clone, Default)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

fn read_ident(s: &str, start: usize) -> (String, usize) {
    let rest = &s[start..];
    let len = rest
        .find(|c: char| c == '#' || c == '.' || c == '[')
        .unwrap_or(rest.len());
    (rest[..len].to_string(), start + len)
}

fn parse_compound(s: &str) -> SimpleSelector {
    let mut sel = SimpleSelector::default();
    let mut i = 0;
    while i < s.len() {
        match s[i..].chars().next().unwrap() {
            '#' => {
                let (ident, next) = read_ident(s, i + 1);
                sel.id = Some(ident);
                i = next;
            }
            '.' => {
                let (ident, next) = read_ident(s, i + 1);
                sel.classes.push(ident);
                i = next;
            }
            '[' => match s[i..].find(']') {
                Some(end) => {
                    let inner = &s[i + 1..i + end];
                    if let Some(value) = inner.strip_prefix("id=") {
                        sel.id = Some(value.trim_matches(['"', '\'']).to_string());
                    }
                    i += end + 1;
                }
                None => break,
            },
            _ => {
                let (ident, next) = read_ident(s, i);
                sel.tag = Some(ident);
                i = next;
            }
        }
    }
    sel
}

fn parse_chain(selector: &str) -> Vec<SimpleSelector> {
    selector.split_whitespace().map(parse_compound).collect()
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    id_attr: Option<String>,
    classes: Vec<String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attrs: FxHashMap<String, String>,
    blocked: bool,
    control: Option<String>,
}

/// Reference `PageSurface` backed by a plain node tree. Real embedders bind
/// a live rendered page; this one serves tests and headless runs.
#[derive(Default)]
pub struct MemoryPage {
    nodes: RwLock<Vec<Node>>,
    query_calls: AtomicUsize,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(&self, parent: Option<NodeId>, tag: &str) -> NodeId {
        let mut nodes = self.nodes.write().unwrap();
        let id = nodes.len();
        nodes.push(Node {
            tag: tag.to_string(),
            id_attr: None,
            classes: vec![],
            text: String::new(),
            parent,
            children: vec![],
            attrs: FxHashMap::default(),
            blocked: false,
            control: None,
        });
        if let Some(parent) = parent {
            nodes[parent].children.push(id);
        }
        id
    }

    pub fn set_id(&self, node: NodeId, id: &str) {
        self.nodes.write().unwrap()[node].id_attr = Some(id.to_string());
    }

    pub fn add_class(&self, node: NodeId, class: &str) {
        self.nodes.write().unwrap()[node].classes.push(class.to_string());
    }

    pub fn set_text(&self, node: NodeId, text: &str) {
        self.nodes.write().unwrap()[node].text = text.to_string();
    }

    pub fn is_blocked(&self, node: NodeId) -> bool {
        self.nodes.read().unwrap()[node].blocked
    }

    pub fn control_channel(&self, node: NodeId) -> Option<String> {
        self.nodes.read().unwrap()[node].control.clone()
    }

    /// Number of `query_all` calls, for observing scan scheduling in tests.
    pub fn query_call_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    fn matches(nodes: &[Node], node: NodeId, sel: &SimpleSelector) -> bool {
        let n = &nodes[node];
        if let Some(ref tag) = sel.tag {
            if &n.tag != tag {
                return false;
            }
        }
        if let Some(ref id) = sel.id {
            if n.id_attr.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        sel.classes.iter().all(|c| n.classes.contains(c))
    }

    /// Descendant-combinator match: `node` matches the last compound and the
    /// remaining compounds match along its ancestor path, in order.
    fn chain_matches(nodes: &[Node], node: NodeId, chain: &[SimpleSelector]) -> bool {
        let Some((last, prefix)) = chain.split_last() else {
            return false;
        };
        if !Self::matches(nodes, node, last) {
            return false;
        }
        let mut idx = prefix.len();
        let mut current = nodes[node].parent;
        while idx > 0 {
            match current {
                Some(ancestor) => {
                    if Self::matches(nodes, ancestor, &prefix[idx - 1]) {
                        idx -= 1;
                    }
                    current = nodes[ancestor].parent;
                }
                None => return false,
            }
        }
        true
    }

    fn descendants(nodes: &[Node], node: NodeId, out: &mut Vec<NodeId>) {
        for &child in &nodes[node].children {
            out.push(child);
            Self::descendants(nodes, child, out);
        }
    }

    fn text_content(nodes: &[Node], node: NodeId) -> String {
        let mut text = nodes[node].text.clone();
        for &child in &nodes[node].children {
            text.push_str(&Self::text_content(nodes, child));
        }
        text
    }
}

impl PageSurface for MemoryPage {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let chain = parse_chain(selector);
        if chain.is_empty() {
            return vec![];
        }
        let nodes = self.nodes.read().unwrap();
        (0..nodes.len())
            .filter(|&id| Self::chain_matches(&nodes, id, &chain))
            .collect()
    }

    fn query_text(&self, node: NodeId, selector: &str) -> Option<String> {
        let chain = parse_chain(selector);
        if chain.is_empty() {
            return None;
        }
        let nodes = self.nodes.read().unwrap();
        let mut candidates = Vec::new();
        Self::descendants(&nodes, node, &mut candidates);
        candidates
            .into_iter()
            .find(|&d| Self::chain_matches(&nodes, d, &chain))
            .map(|d| Self::text_content(&nodes, d))
    }

    fn closest(&self, node: NodeId, selectors: &[&str]) -> Option<NodeId> {
        let chains: Vec<SimpleSelector> = selectors.iter().map(|s| parse_compound(s)).collect();
        let nodes = self.nodes.read().unwrap();
        let mut current = Some(node);
        while let Some(id) = current {
            if chains.iter().any(|sel| Self::matches(&nodes, id, sel)) {
                return Some(id);
            }
            current = nodes[id].parent;
        }
        None
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.read().unwrap()[node].attrs.get(name).cloned()
    }

    fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        self.nodes.write().unwrap()[node]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn set_blocked(&self, node: NodeId, blocked: bool) {
        self.nodes.write().unwrap()[node].blocked = blocked;
    }

    fn attach_block_control(&self, node: NodeId, channel: &str) {
        self.nodes.write().unwrap()[node].control = Some(channel.to_string());
    }

    fn has_block_control(&self, node: NodeId) -> bool {
        self.nodes.read().unwrap()[node].control.is_some()
    }
}
