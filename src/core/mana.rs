//! Mana costs and mana pools

use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mana colors (plus colorless)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    /// WUBRG order, colorless last
    pub const ALL: [Color; 6] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Colorless,
    ];

    pub fn from_symbol(symbol: char) -> Option<Color> {
        match symbol.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'C' => Some(Color::Colorless),
            _ => None,
        }
    }

    /// Lowercase English name, as used in log lines ("protection from red")
    pub fn name(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Blue => "blue",
            Color::Black => "black",
            Color::Red => "red",
            Color::Green => "green",
            Color::Colorless => "colorless",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "W"),
            Color::Blue => write!(f, "U"),
            Color::Black => write!(f, "B"),
            Color::Red => write!(f, "R"),
            Color::Green => write!(f, "G"),
            Color::Colorless => write!(f, "C"),
        }
    }
}

/// A mana cost in `{N}{COLOR}` bracket notation, e.g. `{2}{R}{R}` or `{X}{W}`
///
/// `colorless` counts `{C}` symbols, which only colorless mana can pay.
/// `x` counts `{X}` symbols; the value of X is chosen when the cost is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u8,
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
    pub x: u8,
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{2}{W}{X}`. Bare symbols without braces (`2WX`) are accepted too.
    pub fn parse(s: &str) -> Result<Self> {
        let mut cost = ManaCost::new();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(cost);
        }

        let symbols: Vec<String> = if trimmed.starts_with('{') {
            let mut out = Vec::new();
            let mut rest = trimmed;
            while !rest.is_empty() {
                let open = rest
                    .strip_prefix('{')
                    .ok_or_else(|| MtgError::ParseError(format!("Malformed mana cost: {s}")))?;
                let close = open
                    .find('}')
                    .ok_or_else(|| MtgError::ParseError(format!("Unclosed mana symbol: {s}")))?;
                out.push(open[..close].to_string());
                rest = open[close + 1..].trim_start();
            }
            out
        } else {
            // Bare form: digits group into one generic amount
            let mut out = Vec::new();
            let mut digits = String::new();
            for c in trimmed.chars() {
                if c.is_ascii_digit() {
                    digits.push(c);
                } else {
                    if !digits.is_empty() {
                        out.push(std::mem::take(&mut digits));
                    }
                    out.push(c.to_string());
                }
            }
            if !digits.is_empty() {
                out.push(digits);
            }
            out
        };

        for symbol in symbols {
            if let Ok(n) = symbol.parse::<u8>() {
                cost.generic = cost.generic.saturating_add(n);
                continue;
            }
            let mut chars = symbol.chars();
            match (chars.next(), chars.next()) {
                (Some('X'), None) | (Some('x'), None) => cost.x = cost.x.saturating_add(1),
                (Some(c), None) => match Color::from_symbol(c) {
                    Some(color) => cost.add_colored(color, 1),
                    None => {
                        return Err(MtgError::ParseError(format!(
                            "Unknown mana symbol {{{symbol}}} in {s}"
                        )))
                    }
                },
                _ => {
                    return Err(MtgError::ParseError(format!(
                        "Unknown mana symbol {{{symbol}}} in {s}"
                    )))
                }
            }
        }

        Ok(cost)
    }

    fn add_colored(&mut self, color: Color, n: u8) {
        let slot = match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        };
        *slot = slot.saturating_add(n);
    }

    /// Required amount of one specific color
    pub fn colored(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    pub fn has_x(&self) -> bool {
        self.x > 0
    }

    /// Converted mana cost with X counted as zero
    pub fn cmc(&self) -> u8 {
        [
            self.generic,
            self.white,
            self.blue,
            self.black,
            self.red,
            self.green,
            self.colorless,
        ]
        .into_iter()
        .fold(0u8, u8::saturating_add)
    }

    /// Generic portion including the chosen value of X, or `None` if it
    /// doesn't fit in a `u32`
    pub fn generic_with_x(&self, x_value: u32) -> Option<u32> {
        (self.x as u32)
            .checked_mul(x_value)?
            .checked_add(self.generic as u32)
    }

    pub fn is_free(&self) -> bool {
        self.cmc() == 0 && !self.has_x()
    }

    /// Can `pool` pay this cost with X = `x_value`?
    ///
    /// Every colored requirement must be met by that color, and what remains
    /// must cover generic + X.
    pub fn can_pay(&self, pool: &ManaPool, x_value: u32) -> bool {
        let mut colored_total = 0u32;
        for color in Color::ALL {
            let need = self.colored(color) as u32;
            if pool.get(color) < need {
                return false;
            }
            colored_total += need;
        }
        match self.generic_with_x(x_value) {
            Some(generic) => pool.total() - colored_total >= generic,
            None => false,
        }
    }

    /// Pay this cost from `pool`. Either the whole cost is deducted or nothing is.
    pub fn pay(&self, pool: &mut ManaPool, x_value: u32) -> std::result::Result<(), ManaShortfall> {
        if !self.can_pay(pool, x_value) {
            let colored: u32 = Color::ALL.iter().map(|c| self.colored(*c) as u32).sum();
            return Err(ManaShortfall {
                required: self
                    .generic_with_x(x_value)
                    .map_or(u32::MAX, |generic| generic.saturating_add(colored)),
                available: pool.total(),
            });
        }
        for color in Color::ALL {
            pool.remove(color, self.colored(color) as u32);
        }
        pool.pay_generic(self.generic_with_x(x_value).unwrap_or(u32::MAX))
    }
}

impl FromStr for ManaCost {
    type Err = MtgError;

    fn from_str(s: &str) -> Result<Self> {
        ManaCost::parse(s)
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.x {
            write!(f, "{{X}}")?;
        }
        if self.generic > 0 || (self.cmc() == 0 && self.x == 0) {
            write!(f, "{{{}}}", self.generic)?;
        }
        for color in Color::ALL {
            for _ in 0..self.colored(color) {
                write!(f, "{{{color}}}")?;
            }
        }
        Ok(())
    }
}

/// Returned when a pool cannot cover a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManaShortfall {
    pub required: u32,
    pub available: u32,
}

/// Mana pool for a player
///
/// Counts never go negative: every deduction checks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaPool {
    pub white: u32,
    pub blue: u32,
    pub black: u32,
    pub red: u32,
    pub green: u32,
    pub colorless: u32,
}

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, color: Color) -> &mut u32 {
        match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        }
    }

    pub fn get(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    pub fn add_color(&mut self, color: Color) {
        self.add(color, 1);
    }

    pub fn add(&mut self, color: Color, amount: u32) {
        *self.slot_mut(color) += amount;
    }

    fn remove(&mut self, color: Color, amount: u32) {
        let slot = self.slot_mut(color);
        *slot = slot.saturating_sub(amount);
    }

    pub fn clear(&mut self) {
        *self = ManaPool::new();
    }

    pub fn total(&self) -> u32 {
        self.white + self.blue + self.black + self.red + self.green + self.colorless
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Pay `amount` generic mana, always drawing from the color with the most mana left
    pub fn pay_generic(&mut self, amount: u32) -> std::result::Result<(), ManaShortfall> {
        if self.total() < amount {
            return Err(ManaShortfall {
                required: amount,
                available: self.total(),
            });
        }
        for _ in 0..amount {
            let richest = Color::ALL
                .iter()
                .copied()
                .max_by(|a, b| self.get(*a).cmp(&self.get(*b)).then(b.cmp(a)))
                .unwrap_or(Color::Colorless);
            self.remove(richest, 1);
        }
        Ok(())
    }
}

impl fmt::Display for ManaPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}W {}U {}B {}R {}G {}C",
            self.white, self.blue, self.black, self.red, self.green, self.colorless
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with(colors: &[(Color, u32)]) -> ManaPool {
        let mut pool = ManaPool::new();
        for (color, n) in colors {
            pool.add(*color, *n);
        }
        pool
    }

    #[test]
    fn test_mana_cost_parsing() {
        let cost = ManaCost::parse("{2}{R}{R}").unwrap();
        assert_eq!(cost.generic, 2);
        assert_eq!(cost.red, 2);
        assert_eq!(cost.cmc(), 4);

        let x_cost: ManaCost = "{X}{W}".parse().unwrap();
        assert!(x_cost.has_x());
        assert_eq!(x_cost.white, 1);
        assert_eq!(x_cost.cmc(), 1);

        let bare = ManaCost::parse("10UB").unwrap();
        assert_eq!(bare.generic, 10);
        assert_eq!(bare.blue, 1);
        assert_eq!(bare.black, 1);

        assert!(ManaCost::parse("{Q}").is_err());
        assert!(ManaCost::parse("{2").is_err());
        assert!(ManaCost::parse("").unwrap().is_free());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let cost = ManaCost::parse("{X}{1}{G}{G}").unwrap();
        assert_eq!(cost.to_string(), "{X}{1}{G}{G}");
        assert_eq!(ManaCost::new().to_string(), "{0}");
    }

    #[test]
    fn test_can_pay_with_x() {
        let pool = pool_with(&[(Color::White, 3)]);
        let cost = ManaCost::parse("{X}{W}").unwrap();
        assert!(cost.can_pay(&pool, 2));
        assert!(!cost.can_pay(&pool, 3));
    }

    #[test]
    fn test_huge_x_is_unpayable() {
        let mut pool = pool_with(&[(Color::Red, 3)]);
        let cost = ManaCost::parse("{1}{X}{R}").unwrap();
        assert_eq!(cost.generic_with_x(u32::MAX), None);
        assert!(!cost.can_pay(&pool, u32::MAX));

        let err = cost.pay(&mut pool, u32::MAX).unwrap_err();
        assert_eq!(err.required, u32::MAX);
        assert_eq!(pool.red, 3);
    }

    #[test]
    fn test_pay_x_cost_empties_pool() {
        let mut pool = pool_with(&[(Color::White, 3)]);
        let cost = ManaCost::parse("{X}{W}").unwrap();
        cost.pay(&mut pool, 2).unwrap();
        assert_eq!(pool.total(), 0);
    }

    #[test]
    fn test_colored_requirement_must_match() {
        let mut pool = pool_with(&[(Color::Blue, 2)]);
        let cost = ManaCost::parse("{R}{R}").unwrap();
        assert!(!cost.can_pay(&pool, 0));
        assert!(cost.pay(&mut pool, 0).is_err());
        assert_eq!(pool.blue, 2);
    }

    #[test]
    fn test_failed_payment_leaves_pool_untouched() {
        let mut pool = pool_with(&[(Color::Red, 1), (Color::Green, 1)]);
        let before = pool;
        let cost = ManaCost::parse("{2}{R}").unwrap();
        let err = cost.pay(&mut pool, 0).unwrap_err();
        assert_eq!(err.required, 3);
        assert_eq!(err.available, 2);
        assert_eq!(pool, before);
    }

    #[test]
    fn test_colorless_symbol_needs_colorless_mana() {
        let pool = pool_with(&[(Color::Green, 4)]);
        let cost = ManaCost::parse("{C}").unwrap();
        assert!(!cost.can_pay(&pool, 0));

        let pool = pool_with(&[(Color::Colorless, 1)]);
        assert!(cost.can_pay(&pool, 0));
    }

    #[test]
    fn test_generic_paid_from_largest_color() {
        let mut pool = pool_with(&[(Color::Red, 3), (Color::Blue, 1)]);
        let cost = ManaCost::parse("{2}{U}").unwrap();
        cost.pay(&mut pool, 0).unwrap();
        assert_eq!(pool.blue, 0);
        assert_eq!(pool.red, 1);
    }

    #[test]
    fn test_pay_generic_exact() {
        let mut pool = pool_with(&[(Color::White, 1), (Color::Black, 2)]);
        pool.pay_generic(3).unwrap();
        assert!(pool.is_empty());
        assert!(pool.pay_generic(1).is_err());
    }

    #[test]
    fn test_mana_pool_total_and_clear() {
        let mut pool = ManaPool::new();
        pool.add_color(Color::Red);
        pool.add_color(Color::Blue);
        pool.add(Color::White, 2);
        assert_eq!(pool.total(), 4);
        assert_eq!(pool.to_string(), "2W 1U 0B 1R 0G 0C");

        pool.clear();
        assert!(pool.is_empty());
    }
}
