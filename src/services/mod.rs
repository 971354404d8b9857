//! Service layer: policy, events, memory, validation, agents, learning.

pub mod agents;
pub mod event_bus;
pub mod learning;
pub mod policy;
pub mod shared_memory;
pub mod validation_gateway;

pub use agents::{GenerationAgent, PatternAgent, PipelineAgent, ValidatorAgent};
pub use event_bus::{EventBus, EventHandler, PublishAck, SubscriptionId};
pub use learning::{LearningService, LEARNING_SCOPE};
pub use policy::{BlockedType, PolicyDecision, PolicyEngine};
pub use shared_memory::SharedMemory;
pub use validation_gateway::ValidationGateway;
