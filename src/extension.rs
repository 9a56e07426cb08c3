//! Parser extensions
//!
//! An ordered, append-only chain of handlers that can claim words the
//! core tables do not recognize and execute them during dispatch. This is
//! how optional or non-standard codes are added without touching the
//! validated core rule set. Registration order is the iteration order for
//! parsing, validation, and execution; the first handler to claim a word
//! wins.

use crate::error::Error;
use crate::parser::tokenizer::Block;
use crate::state::modal::ModalGroups;
use crate::state::parameters::Parameters;
use crate::state::run::RunState;

/// Outcome of offering a word to one extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The extension takes ownership of the word.
    Claimed,
    /// Not this extension's word; keep asking down the chain.
    Pass,
}

/// One pluggable handler in the chain.
pub trait ParserExtension {
    /// Offered every word the core tables reject, in registration order.
    /// A claiming extension records whatever it needs in `block` (and in
    /// itself) for the later phases.
    fn parse_word(&mut self, letter: char, value: f64, block: &mut Block)
    -> Result<Claim, Error>;

    /// Extra legality checks for claimed words; runs after the core
    /// rules. The default accepts.
    fn validate(&self, _block: &Block, _modal: &ModalGroups) -> Result<(), Error> {
        Ok(())
    }

    /// Execute claimed words during the dispatch pass.
    fn execute(
        &mut self,
        block: &Block,
        modal: &mut ModalGroups,
        run: &mut RunState,
        params: &mut Parameters,
    ) -> Result<(), Error>;
}

/// The registered handlers, in registration order.
#[derive(Default)]
pub struct ExtensionChain {
    handlers: Vec<Box<dyn ParserExtension>>,
}

impl ExtensionChain {
    pub fn new() -> Self {
        ExtensionChain::default()
    }

    /// Append a handler. Handlers are never removed.
    pub fn register(&mut self, handler: Box<dyn ParserExtension>) {
        self.handlers.push(handler);
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Offer an unrecognized word down the chain; first claim wins.
    pub(crate) fn offer_word(
        &mut self,
        letter: char,
        value: f64,
        block: &mut Block,
    ) -> Result<Claim, Error> {
        for handler in &mut self.handlers {
            match handler.parse_word(letter, value, block)? {
                Claim::Claimed => return Ok(Claim::Claimed),
                Claim::Pass => continue,
            }
        }
        Ok(Claim::Pass)
    }

    /// Run every handler's legality hook; the first failure wins.
    pub(crate) fn validate(&self, block: &Block, modal: &ModalGroups) -> Result<(), Error> {
        for handler in &self.handlers {
            handler.validate(block, modal)?;
        }
        Ok(())
    }

    /// Run every handler's execute hook, in registration order.
    pub(crate) fn execute(
        &mut self,
        block: &Block,
        modal: &mut ModalGroups,
        run: &mut RunState,
        params: &mut Parameters,
    ) -> Result<(), Error> {
        for handler in &mut self.handlers {
            handler.execute(block, modal, run, params)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExtensionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionChain")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
