//! Core pipeline for secure Kafka topic dumps.
//!
//! One invocation drives a single linear run:
//! validate request → guard disk capacity → extract the topic to a capture
//! file → archive, compress, encrypt and digest it → publish the encrypted
//! artifact to the artifact store, with bounded per-stage retries, an
//! append-only audit trail, and a working directory that is removed on every
//! exit path.
//!
//! Each stage is a narrow collaborator trait ([`extractor::ExtractMessages`],
//! [`sealer::SealArtifact`], [`publisher::PublishArtifact`]) so the
//! [`orchestrator::Orchestrator`] is testable with fakes.

pub mod errors;
pub mod extractor;
pub mod guard;
pub mod orchestrator;
pub mod publisher;
pub mod retry;
pub mod sealer;
pub mod settings;
pub mod validator;
pub mod workdir;
