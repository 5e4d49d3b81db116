use std::fmt;

use anyhow::bail;
use log::{debug, info, warn};
use pest::{error::Error as PestError, iterators::Pair, Parser};
use pest_derive::Parser;

use crate::tree::{
    Node,
    NodeIdx::{self, Internal as Int, Leaf},
    Tree,
};
use crate::Result;

#[derive(Parser)]
#[grammar = "./tree/newick.pest"]
pub struct NewickParser;

#[derive(Debug)]
pub struct ParsingError(pub(crate) Box<PestError<Rule>>);

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Malformed newick string")?;
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParsingError {}

/// Parses all trees in a newick string. Every tree is treated as rooted at its outermost
/// node, multifurcations are kept as they are. Branch lengths are read but not kept and
/// numeric internal labels are taken as support values.
/// Unnamed internal nodes get synthetic `Node{k}` names, see [`Tree::assign_internal_names`].
///
/// # Example
/// ```
/// use mrca_asr::tree::tree_parser::from_newick;
/// let trees = from_newick("(((A,B)N1,C)N2,(D,E)N3)N4;").unwrap();
/// assert_eq!(trees.len(), 1);
/// assert_eq!(trees[0].n, 5);
/// ```
pub fn from_newick(newick: &str) -> Result<Vec<Tree>> {
    info!("Parsing newick trees.");
    let newick_rule = match NewickParser::parse(Rule::newick, newick) {
        Ok(mut pairs) => match pairs.next() {
            Some(rule) => rule,
            None => bail!("Empty newick string"),
        },
        Err(e) => bail!(ParsingError(Box::new(e))),
    };
    let mut trees = Vec::new();
    for tree_rule in newick_rule.into_inner() {
        match tree_rule.as_rule() {
            Rule::tree => {
                let mut tree = Tree::new_empty();
                tree.parse_tree_rule(tree_rule);
                trees.push(tree);
            }
            Rule::EOI => (),
            _ => unreachable!(),
        }
    }
    info!("Finished parsing {} newick tree(s) successfully.", trees.len());
    Ok(trees)
}

impl Tree {
    fn new_empty() -> Self {
        Self {
            root: Int(0),
            nodes: Vec::new(),
            preorder: Vec::new(),
            n: 0,
        }
    }

    fn parse_tree_rule(&mut self, tree_rule: Pair<Rule>) {
        let mut node_idx = 0;
        for rule in tree_rule.into_inner() {
            match rule.as_rule() {
                Rule::leaf => {
                    self.parse_leaf_rule(&mut node_idx, rule);
                    self.root = Leaf(0);
                }
                Rule::internal => {
                    self.parse_internal_rule(&mut node_idx, rule);
                    self.root = Int(0);
                }
                _ => unreachable!(),
            }
        }
        self.complete();
    }

    fn complete(&mut self) {
        self.n = self.nodes.iter().filter(|node| node.is_leaf()).count();
        self.compute_preorder();
        self.assign_internal_names();
        let duplicates = self.duplicate_leaf_ids();
        if !duplicates.is_empty() {
            warn!(
                "Tree has duplicate leaf ids, taxon matching will use the first one: {:?}",
                duplicates
            );
        }
    }

    // Nodes are pushed before their children, so the arena is in preorder.
    fn parse_internal_rule(&mut self, node_idx: &mut usize, internal_rule: Pair<Rule>) {
        let cur_node_idx = *node_idx;
        self.nodes.push(Node::new_empty_internal(cur_node_idx));
        *node_idx += 1;

        let mut children: Vec<NodeIdx> = Vec::new();
        for rule in internal_rule.into_inner() {
            match rule.as_rule() {
                Rule::label => {
                    let label = Tree::parse_label_rule(rule);
                    if is_support_value(&label) {
                        debug!("Dropping support value {} of an internal node", label);
                    } else {
                        self.nodes[cur_node_idx].id = label;
                    }
                }
                Rule::branch_length => (),
                Rule::internal => {
                    children.push(Int(*node_idx));
                    self.parse_internal_rule(node_idx, rule);
                }
                Rule::leaf => {
                    children.push(Leaf(*node_idx));
                    self.parse_leaf_rule(node_idx, rule);
                }
                _ => unreachable!(),
            }
        }
        for child_idx in &children {
            self.nodes[usize::from(child_idx)].add_parent(&Int(cur_node_idx));
        }
        self.nodes[cur_node_idx].children = children;
    }

    fn parse_leaf_rule(&mut self, node_idx: &mut usize, inner_rule: Pair<Rule>) {
        let mut id = String::from("");
        for rule in inner_rule.into_inner() {
            match rule.as_rule() {
                Rule::label => id = Tree::parse_label_rule(rule),
                Rule::branch_length => (),
                _ => unreachable!(),
            }
        }
        self.nodes.push(Node::new_leaf(*node_idx, id));
        *node_idx += 1;
    }

    fn parse_label_rule(rule: Pair<Rule>) -> String {
        match rule.into_inner().next() {
            Some(inner) if inner.as_rule() == Rule::quoted => {
                let quoted = inner.as_str();
                quoted[1..quoted.len() - 1].replace("''", "'")
            }
            Some(inner) => inner.as_str().to_string(),
            None => String::new(),
        }
    }
}

// Internal labels such as bootstrap values are support, not node names.
fn is_support_value(label: &str) -> bool {
    label.parse::<f64>().is_ok_and(f64::is_finite)
}
