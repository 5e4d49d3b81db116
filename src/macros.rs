#[macro_export]
macro_rules! record_wo_desc {
    ($e1:expr,$e2:expr) => {{
        use bio::io::fasta::Record;
        Record::with_attrs($e1, None, $e2)
    }};
}

#[macro_export]
macro_rules! record {
    ($e1:expr,$e2:expr,$e3:expr) => {{
        use bio::io::fasta::Record;
        Record::with_attrs($e1, $e2, $e3)
    }};
}

#[macro_export]
macro_rules! tree {
    ($e:expr) => {{
        use $crate::tree::tree_parser::from_newick;
        from_newick($e).unwrap().pop().unwrap()
    }};
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
pub mod tests {
    #[test]
    fn test_record_macro() {
        let record = record!("seq1", Some("description"), b"ATCG");
        assert_eq!(record.id(), "seq1");
        assert_eq!(record.desc(), Some("description"));
        assert_eq!(record.seq(), b"ATCG");

        let record = record_wo_desc!("seq2", b"TTTT");
        assert_eq!(record.id(), "seq2");
        assert_eq!(record.desc(), None);
        assert_eq!(record.seq(), b"TTTT");
    }

    #[test]
    fn test_tree_macro() {
        let tree = tree!("((A:1.0,B:1.0)E:2.0,C:1.0)F;");
        assert_eq!(tree.n, 3);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.node_id(&tree.root), "F");
    }
}
