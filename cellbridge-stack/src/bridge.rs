use cellbridge_config::{ConfigCodec, ConfigParamBridge};
use cellbridge_core::StdAddress;
use cellbridge_core::numeric::bigint_to_array;
use cellbridge_gql::AccountFetcher;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::BridgeError;
use crate::stack::OperandStack;
use crate::value::{Atom, AtomTable, StackValue};

/// A command the bridge can run against an operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    /// `( cell i -- $ )`
    CfgBocToJson,
    /// `( $ i -- cell )`
    JsonToCfgBoc,
    /// `( wc addr url -- tuple )`
    FetchAccount,
}

/// Ordered table of word names.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: IndexMap<&'static str, Word>,
}

impl Dictionary {
    pub fn empty() -> Self {
        Self {
            words: IndexMap::new(),
        }
    }

    /// The bridge words under their long names and their short aliases.
    pub fn standard() -> Self {
        let mut dict = Self::empty();
        dict.define("cfg_boc_to_json", Word::CfgBocToJson);
        dict.define("cfg>$j", Word::CfgBocToJson);
        dict.define("json_to_cfg_boc", Word::JsonToCfgBoc);
        dict.define("$j>cfg", Word::JsonToCfgBoc);
        dict.define("fetch_account", Word::FetchAccount);
        dict.define("~>acc", Word::FetchAccount);
        dict
    }

    /// Binds `name` to `word`, replacing any earlier binding.
    pub fn define(&mut self, name: &'static str, word: Word) {
        self.words.insert(name, word);
    }

    pub fn lookup(&self, name: &str) -> Option<Word> {
        self.words.get(name).copied()
    }

    /// Word names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.words.keys().copied()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::standard()
    }
}

struct AccountKeys {
    code: Atom,
    data: Atom,
    balance: Atom,
}

/// Runs bridge words against a host operand stack.
///
/// Every failure is returned to the caller unchanged; on failure the stack
/// may have lost the operands popped before the error was detected, except
/// for underflow, which is checked before anything is popped.
pub struct Bridge<C, F> {
    config: ConfigParamBridge<C>,
    fetcher: F,
    atoms: AtomTable,
    keys: AccountKeys,
    dictionary: Dictionary,
}

impl<C: ConfigCodec, F: AccountFetcher> Bridge<C, F> {
    pub fn new(codec: C, fetcher: F) -> Self {
        let mut atoms = AtomTable::new();
        let keys = AccountKeys {
            code: atoms.intern(".code"),
            data: atoms.intern(".data"),
            balance: atoms.intern(".balance"),
        };
        Self {
            config: ConfigParamBridge::new(codec),
            fetcher,
            atoms,
            keys,
            dictionary: Dictionary::standard(),
        }
    }

    pub fn config(&self) -> &ConfigParamBridge<C> {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Looks `name` up in the dictionary and runs it.
    pub fn execute<S>(&self, name: &str, stack: &mut S) -> Result<(), BridgeError>
    where
        S: OperandStack + ?Sized,
    {
        let word = self
            .dictionary
            .lookup(name)
            .ok_or_else(|| BridgeError::UnknownWord(name.to_string()))?;
        self.run(word, stack)
    }

    pub fn run<S>(&self, word: Word, stack: &mut S) -> Result<(), BridgeError>
    where
        S: OperandStack + ?Sized,
    {
        match word {
            Word::CfgBocToJson => self.cfg_boc_to_json(stack),
            Word::JsonToCfgBoc => self.json_to_cfg_boc(stack),
            Word::FetchAccount => self.fetch_account(stack),
        }
    }

    /// `( cell i -- $ )`: decodes config parameter `i` into compact JSON text.
    #[instrument(skip_all)]
    pub fn cfg_boc_to_json<S>(&self, stack: &mut S) -> Result<(), BridgeError>
    where
        S: OperandStack + ?Sized,
    {
        stack.check_underflow(2)?;
        let param = pop_param(stack)?;
        let cell = stack.pop_cell()?;

        let value = self.config.boc_to_json(&cell, param)?;
        stack.push(StackValue::String(value.to_string()));
        Ok(())
    }

    /// `( $ i -- cell )`: encodes JSON text as config parameter `i`.
    #[instrument(skip_all)]
    pub fn json_to_cfg_boc<S>(&self, stack: &mut S) -> Result<(), BridgeError>
    where
        S: OperandStack + ?Sized,
    {
        stack.check_underflow(2)?;
        let param = pop_param(stack)?;
        let text = stack.pop_string()?;

        let value: Value = serde_json::from_str(&text)?;
        let cell = self.config.json_to_boc(value, param)?;
        stack.push(StackValue::Cell(cell));
        Ok(())
    }

    /// `( wc addr url -- tuple )`: fetches account state.
    ///
    /// Pushes `[ [ .code cell ] [ .data cell ] [ .balance int ] ]`, always in
    /// that order.
    #[instrument(skip_all)]
    pub fn fetch_account<S>(&self, stack: &mut S) -> Result<(), BridgeError>
    where
        S: OperandStack + ?Sized,
    {
        stack.check_underflow(3)?;
        let endpoint = stack.pop_string()?;
        let account = stack.pop_int()?;
        let account = bigint_to_array::<32>(&account)?;
        let workchain = stack.pop_smallint_range(i8::MIN.into(), i8::MAX.into())? as i8;

        let address = StdAddress::new(workchain, account).to_string();
        debug!(%address, %endpoint, "fetching account");
        let info = self.fetcher.get_account_info(&endpoint, &address)?;

        let code = info.code_cell()?;
        let data = info.data_cell()?;
        let balance = info.balance_int()?;

        stack.push(StackValue::Tuple(vec![
            StackValue::pair(self.keys.code.clone(), StackValue::Cell(code)),
            StackValue::pair(self.keys.data.clone(), StackValue::Cell(data)),
            StackValue::pair(self.keys.balance.clone(), StackValue::Int(balance)),
        ]));
        Ok(())
    }
}

fn pop_param<S: OperandStack + ?Sized>(stack: &mut S) -> Result<i32, BridgeError> {
    let param = stack.pop_smallint_range(i32::MIN.into(), i32::MAX.into())?;
    Ok(param as i32)
}
