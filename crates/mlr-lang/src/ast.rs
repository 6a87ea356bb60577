pub mod node;
pub mod node_type;

pub use node::AstNode;
pub use node_type::NodeType;
