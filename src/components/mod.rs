pub mod treehouze;
