use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Highest id handed out in any namespace.
pub const MAX_STORE: usize = 32767;

/// Scalar ids below this are the registers and `last`.
pub const FIRST_SCALAR: usize = 4;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Scalar,
    Array,
    Function,
}

#[derive(Debug)]
struct Node {
    name: Rc<str>,
    scalar: usize,
    array: usize,
    function: usize,
    left: Option<NodeId>,
    right: Option<NodeId>,
    balance: i8,
}

/// ## Identifier table
///
/// AVL tree of names stored in an arena. Each name owns one lazily
/// assigned id per namespace; ids are never reused.

#[derive(Debug)]
pub struct SymbolTable {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    next_scalar: usize,
    next_array: usize,
    next_function: usize,
    scalar_names: Vec<Rc<str>>,
    array_names: Vec<Rc<str>>,
    function_names: Vec<Rc<str>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        let fixed: Vec<Rc<str>> = ["ibase", "obase", "scale", "last"]
            .iter()
            .map(|s| Rc::from(*s))
            .collect();
        SymbolTable {
            nodes: vec![],
            root: None,
            next_scalar: FIRST_SCALAR,
            next_array: 1,
            next_function: 1,
            scalar_names: fixed,
            array_names: vec![Rc::from("")],
            function_names: vec![Rc::from("(main)")],
        }
    }
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_or_create(&mut self, name: &str) -> NodeId {
        let (root, _, found) = self.insert(self.root, name);
        self.root = Some(root);
        found
    }

    /// Returns the id of `node` in `ns`, assigning the next free one on
    /// first use.
    pub fn allocate(&mut self, node: NodeId, ns: Namespace) -> Result<usize> {
        let current = match ns {
            Namespace::Scalar => self.nodes[node].scalar,
            Namespace::Array => self.nodes[node].array,
            Namespace::Function => self.nodes[node].function,
        };
        if current != 0 {
            return Ok(current);
        }
        let name = self.nodes[node].name.clone();
        let (next, names) = match ns {
            Namespace::Scalar => (&mut self.next_scalar, &mut self.scalar_names),
            Namespace::Array => (&mut self.next_array, &mut self.array_names),
            Namespace::Function => (&mut self.next_function, &mut self.function_names),
        };
        // Scalars may use MAX_STORE itself, arrays and functions stop below it.
        let limit = match ns {
            Namespace::Scalar => MAX_STORE,
            Namespace::Array | Namespace::Function => MAX_STORE - 1,
        };
        if *next > limit {
            let what = match ns {
                Namespace::Scalar => "variables",
                Namespace::Array => "arrays",
                Namespace::Function => "functions",
            };
            return Err(error!(TooManyIdentifiers; format!("Too many {}", what)));
        }
        let id = *next;
        *next += 1;
        names.push(name);
        let slot = &mut self.nodes[node];
        match ns {
            Namespace::Scalar => slot.scalar = id,
            Namespace::Array => slot.array = id,
            Namespace::Function => slot.function = id,
        }
        Ok(id)
    }

    pub fn lookup(&mut self, name: &str, ns: Namespace) -> Result<usize> {
        let node = self.find_or_create(name);
        self.allocate(node, ns)
    }

    pub fn name(&self, ns: Namespace, id: usize) -> Option<&str> {
        let names = match ns {
            Namespace::Scalar => &self.scalar_names,
            Namespace::Array => &self.array_names,
            Namespace::Function => &self.function_names,
        };
        names.get(id).map(|s| s.as_ref())
    }

    /// Highest id handed out so far in `ns`.
    pub fn last_id(&self, ns: Namespace) -> usize {
        match ns {
            Namespace::Scalar => self.next_scalar - 1,
            Namespace::Array => self.next_array - 1,
            Namespace::Function => self.next_function - 1,
        }
    }

    pub fn height(&self) -> usize {
        self.subtree_height(self.root)
    }

    /// Names in ascending order.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.walk(self.root, &mut out);
        out
    }

    fn walk<'a>(&'a self, node: Option<NodeId>, out: &mut Vec<&'a str>) {
        if let Some(id) = node {
            self.walk(self.nodes[id].left, out);
            out.push(&self.nodes[id].name);
            self.walk(self.nodes[id].right, out);
        }
    }

    fn subtree_height(&self, node: Option<NodeId>) -> usize {
        match node {
            None => 0,
            Some(id) => {
                1 + self
                    .subtree_height(self.nodes[id].left)
                    .max(self.subtree_height(self.nodes[id].right))
            }
        }
    }

    /// Returns the new subtree root, whether the subtree grew taller, and
    /// the node holding `name`.
    fn insert(&mut self, node: Option<NodeId>, name: &str) -> (NodeId, bool, NodeId) {
        let id = match node {
            None => {
                let id = self.nodes.len();
                self.nodes.push(Node {
                    name: Rc::from(name),
                    scalar: 0,
                    array: 0,
                    function: 0,
                    left: None,
                    right: None,
                    balance: 0,
                });
                return (id, true, id);
            }
            Some(id) => id,
        };
        match name.cmp(&self.nodes[id].name) {
            Ordering::Equal => (id, false, id),
            Ordering::Less => {
                let (child, grew, found) = self.insert(self.nodes[id].left, name);
                self.nodes[id].left = Some(child);
                if !grew {
                    return (id, false, found);
                }
                self.nodes[id].balance -= 1;
                match self.nodes[id].balance {
                    0 => (id, false, found),
                    -1 => (id, true, found),
                    _ => (self.rebalance_left(id), false, found),
                }
            }
            Ordering::Greater => {
                let (child, grew, found) = self.insert(self.nodes[id].right, name);
                self.nodes[id].right = Some(child);
                if !grew {
                    return (id, false, found);
                }
                self.nodes[id].balance += 1;
                match self.nodes[id].balance {
                    0 => (id, false, found),
                    1 => (id, true, found),
                    _ => (self.rebalance_right(id), false, found),
                }
            }
        }
    }

    // Left subtree is two taller than the right.
    fn rebalance_left(&mut self, a: NodeId) -> NodeId {
        let b = match self.nodes[a].left {
            Some(b) => b,
            None => return a,
        };
        if self.nodes[b].balance <= 0 {
            self.nodes[a].left = self.nodes[b].right;
            self.nodes[b].right = Some(a);
            self.nodes[a].balance = 0;
            self.nodes[b].balance = 0;
            return b;
        }
        let c = match self.nodes[b].right {
            Some(c) => c,
            None => return a,
        };
        self.nodes[b].right = self.nodes[c].left;
        self.nodes[a].left = self.nodes[c].right;
        self.nodes[c].left = Some(b);
        self.nodes[c].right = Some(a);
        let (ba, bb) = match self.nodes[c].balance {
            -1 => (1, 0),
            1 => (0, -1),
            _ => (0, 0),
        };
        self.nodes[a].balance = ba;
        self.nodes[b].balance = bb;
        self.nodes[c].balance = 0;
        c
    }

    // Mirror of `rebalance_left`.
    fn rebalance_right(&mut self, a: NodeId) -> NodeId {
        let b = match self.nodes[a].right {
            Some(b) => b,
            None => return a,
        };
        if self.nodes[b].balance >= 0 {
            self.nodes[a].right = self.nodes[b].left;
            self.nodes[b].left = Some(a);
            self.nodes[a].balance = 0;
            self.nodes[b].balance = 0;
            return b;
        }
        let c = match self.nodes[b].left {
            Some(c) => c,
            None => return a,
        };
        self.nodes[b].left = self.nodes[c].right;
        self.nodes[a].right = self.nodes[c].left;
        self.nodes[c].right = Some(b);
        self.nodes[c].left = Some(a);
        let (ba, bb) = match self.nodes[c].balance {
            1 => (-1, 0),
            -1 => (0, 1),
            _ => (0, 0),
        };
        self.nodes[a].balance = ba;
        self.nodes[b].balance = bb;
        self.nodes[c].balance = 0;
        c
    }

    #[cfg(test)]
    fn check_balance(&self, node: Option<NodeId>) -> usize {
        match node {
            None => 0,
            Some(id) => {
                let l = self.check_balance(self.nodes[id].left);
                let r = self.check_balance(self.nodes[id].right);
                assert_eq!(self.nodes[id].balance as isize, r as isize - l as isize);
                1 + l.max(r)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_per_namespace() {
        let mut st = SymbolTable::new();
        assert_eq!(st.lookup("a", Namespace::Scalar).unwrap(), 4);
        assert_eq!(st.lookup("b", Namespace::Scalar).unwrap(), 5);
        assert_eq!(st.lookup("a", Namespace::Array).unwrap(), 1);
        assert_eq!(st.lookup("a", Namespace::Function).unwrap(), 1);
        assert_eq!(st.lookup("a", Namespace::Scalar).unwrap(), 4);
        assert_eq!(st.lookup("b", Namespace::Function).unwrap(), 2);
        assert_eq!(st.name(Namespace::Scalar, 5), Some("b"));
        assert_eq!(st.name(Namespace::Function, 0), Some("(main)"));
        assert_eq!(st.len(), 2);
    }

    #[test]
    fn test_rotations() {
        for order in [["a", "b", "c"], ["c", "b", "a"], ["a", "c", "b"], ["c", "a", "b"]] {
            let mut st = SymbolTable::new();
            for name in order.iter() {
                st.find_or_create(name);
            }
            assert_eq!(st.height(), 2, "{:?}", order);
            assert_eq!(st.names(), vec!["a", "b", "c"]);
            st.check_balance(st.root);
        }
    }

    #[test]
    fn test_sequential_inserts_stay_balanced() {
        let mut st = SymbolTable::new();
        for i in 0..1000 {
            st.find_or_create(&format!("v{:04}", i));
        }
        st.check_balance(st.root);
        assert!(st.height() <= 14);
    }

    #[test]
    fn test_too_many_identifiers() {
        let mut st = SymbolTable::new();
        st.next_array = MAX_STORE - 1;
        assert_eq!(st.lookup("x", Namespace::Array).unwrap(), MAX_STORE - 1);
        let e = st.lookup("y", Namespace::Array).unwrap_err();
        assert!(e.is_fatal());
        assert_eq!(st.lookup("x", Namespace::Array).unwrap(), MAX_STORE - 1);

        st.next_function = MAX_STORE;
        assert!(st.lookup("f", Namespace::Function).unwrap_err().is_fatal());

        st.next_scalar = MAX_STORE;
        assert_eq!(st.lookup("x", Namespace::Scalar).unwrap(), MAX_STORE);
        assert!(st.lookup("y", Namespace::Scalar).unwrap_err().is_fatal());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn avl_height_bound(names in prop::collection::vec("[a-z]{1,6}", 0..300)) {
                let mut st = SymbolTable::new();
                for name in &names {
                    st.find_or_create(name);
                }
                let n = st.len() as f64;
                let bound = (1.44 * (n + 2.0).log2()).ceil() as usize;
                prop_assert!(st.height() <= bound);
                st.check_balance(st.root);
            }

            #[test]
            fn in_order_is_sorted(names in prop::collection::vec("[a-z]{1,6}", 0..300)) {
                let mut st = SymbolTable::new();
                for name in &names {
                    st.find_or_create(name);
                }
                let listed = st.names();
                prop_assert!(listed.windows(2).all(|w| w[0] < w[1]));
            }

            #[test]
            fn lookup_is_idempotent(names in prop::collection::vec("[a-z]{1,4}", 1..100)) {
                let mut st = SymbolTable::new();
                let first: Vec<(usize, usize)> = names
                    .iter()
                    .map(|n| {
                        (
                            st.lookup(n, Namespace::Scalar).unwrap(),
                            st.lookup(n, Namespace::Array).unwrap(),
                        )
                    })
                    .collect();
                for (name, ids) in names.iter().zip(first) {
                    prop_assert_eq!(st.lookup(name, Namespace::Scalar).unwrap(), ids.0);
                    prop_assert_eq!(st.lookup(name, Namespace::Array).unwrap(), ids.1);
                }
            }
        }
    }
}
