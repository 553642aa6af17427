//! OWL オントロジーモデル
//!
//! このクレートは分類器と実体化レイヤーが共有するデータモデルを提供します:
//! - IRI / クラス / オブジェクトプロパティ / クラス式
//! - 公理とオントロジー (owl:imports の解決を含む)
//! - トリプルからのオントロジー読み込み

pub mod model;
pub mod loader;
pub mod manager;
pub mod vocabulary;

pub use model::{Axiom, Class, ClassExpression, Entity, Imports, ObjectProperty, Ontology, OwlIri, Triple};
pub use loader::{DefaultOntologyLoader, OntologyLoader};
pub use manager::OntologyManager;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OwlError {
    #[error("Malformed ontology: {0}")]
    Malformed(String),

    #[error("Unresolved import: {0}")]
    MissingImport(OwlIri),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
