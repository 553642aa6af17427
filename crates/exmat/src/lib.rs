//! 式実体化リーズナー
//!
//! 名前付きクラスしか効率よく扱えない分類器の上で、存在制限 (R some C) を
//! 同値な合成クラスとして実体化し、問い合わせの入出力を相互に変換します。
//!
//! - `ExpressionRegistry`: 合成クラスと存在制限の双方向キャッシュ
//! - `ExpandedOntology`: 元オントロジーの import と生成された公理
//! - `RangeAxiomRewriter`: 値域公理から充足不能性の公理を生成
//! - `ExpressionMaterializer`: 実体化と式を考慮した問い合わせ
//! - `MaterializingReasoner`: 分類器インターフェースのファサード

pub mod config;
pub mod naming;
pub mod registry;
pub mod expanded;
pub mod range;
pub mod materializer;
pub mod query;
pub mod reasoner;

pub use config::MaterializerConfig;
pub use expanded::ExpandedOntology;
pub use materializer::{ExpressionMaterializer, MaterializationReport};
pub use naming::{escape_iri, synthetic_iri, synthetic_label};
pub use query::{ExistentialSubsumption, SubsumptionProgress};
pub use range::{RangeAxiomRewriter, RangeRewriteReport};
pub use reasoner::MaterializingReasoner;
pub use registry::{Existential, ExpressionRegistry, Registration, SyntheticClass};

pub use exmat_classifier::{BufferingMode, Classifier, ClassifierError, ClassifierFactory, IncrementalClassifier};
