pub mod assessment;
pub mod chunker;
pub mod composer;
pub mod index;
pub mod ingestion;
pub mod normalize;
pub mod retrieval;

pub use assessment::{AnswerAssessor, Assessment};
pub use chunker::Chunker;
pub use composer::ResponseComposer;
pub use index::{IndexStats, KnowledgeIndex, SnapshotInfo, remove_snapshot};
pub use ingestion::{
    CommitOutcome, IndexMode, IngestionCoordinator, IngestionReport, TypeSummary, commit,
};
pub use normalize::{
    AudioNormalizer, DocumentNormalizer, ImageNormalizer, NormalizeReport, Normalizer,
    TextNormalizer, VideoNormalizer,
};
pub use retrieval::Retriever;
