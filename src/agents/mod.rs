//! Agent definition handling: frontmatter parsing, discovery, compliance
//! checking, and formatting fixers for the markdown files under
//! `.claude/agents/`.

pub mod compliance;
pub mod fixer;
pub mod frontmatter;
pub mod loader;

pub use compliance::check_agents;
pub use frontmatter::{AgentFrontmatter, ModelTier, RawFrontmatter, parse_frontmatter};
pub use loader::{AgentEntry, find_claude_dir, load_agents};
