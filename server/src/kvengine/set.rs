/*
 * Created on Thu Mar 25 2021
 *
 * This file is a part of Spinel
 * Spinel is a free and open-source in-memory key/value database that
 * speaks the RESP wire protocol, written by the Spinel developers with
 * the vision to provide a simple and reliable caching primitive without
 * compromising on performance.
 *
 * Copyright (c) 2021, The Spinel developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! # `SET` queries
//! This module provides functions to work with `SET` queries and the
//! option tokens that go with them: `NX`/`XX` presence conditions, `GET`
//! for the prior value, and the `EX`/`PX`/`EXAT`/`PXAT` expiry family

use crate::coredb::{self, CoreDB, Data, Record, Value};
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::Connection;
use crate::kvengine::{ensure_length, ActionError, ActionResult};
use crate::protocol::responses;
use crate::protocol::{parse_into_i64, ActionGroup};
use crate::resp::StringWrapper;
use crate::util::Unwrappable;
use bytes::Bytes;

/// The parsed option tokens of a `SET` request
#[derive(Debug, Default, PartialEq)]
struct SetOptions {
    /// only set if the key does not exist
    nx: bool,
    /// only set if the key exists
    xx: bool,
    /// reply with the prior value instead of `OK`
    get: bool,
    /// the computed expiration instant (milliseconds since the epoch)
    expiry: Option<i64>,
}

/// Parse the tokens that follow `SET <key> <value>`. Option tokens are
/// case-sensitive uppercase; `NX` and `XX` are mutually exclusive and only
/// one expiry option may appear
fn parse_options(mut parts: impl Iterator<Item = Data>, now: i64) -> ActionResult<SetOptions> {
    let mut options = SetOptions::default();
    while let Some(token) = parts.next() {
        match &token[..] {
            b"NX" => {
                if options.xx {
                    return Err(ActionError::ActionError(responses::groups::SYNTAX_ERR));
                }
                options.nx = true;
            }
            b"XX" => {
                if options.nx {
                    return Err(ActionError::ActionError(responses::groups::SYNTAX_ERR));
                }
                options.xx = true;
            }
            b"GET" => options.get = true,
            b"EX" | b"PX" | b"EXAT" | b"PXAT" => {
                if options.expiry.is_some() {
                    return Err(ActionError::ActionError(responses::groups::SYNTAX_ERR));
                }
                let operand = match parts.next() {
                    Some(operand) => operand,
                    // a trailing expiry option without its integer
                    None => return Err(ActionError::ActionError(responses::groups::SYNTAX_ERR)),
                };
                let int = match parse_into_i64(&operand) {
                    Some(int) => int,
                    None => {
                        return Err(ActionError::ActionError(
                            responses::groups::INTEGER_CONVERSION_ERR,
                        ))
                    }
                };
                options.expiry = Some(match &token[..] {
                    b"EX" => now.saturating_add(int.saturating_mul(1000)),
                    b"PX" => now.saturating_add(int),
                    b"EXAT" => int.saturating_mul(1000),
                    // PXAT
                    _ => int,
                });
            }
            _ => return Err(ActionError::ActionError(responses::groups::SYNTAX_ERR)),
        }
    }
    Ok(options)
}

/// What a `SET` ends up replying with
enum Outcome {
    /// the plain `OK`
    Okay,
    /// the prior value, echoed as a simple string for the `GET` option
    Prior(Bytes),
    /// the null bulk string
    Nil,
}

/// Run a `SET` query
pub async fn set<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    ensure_length(act.howmany(), |len| len >= 2)?;
    let mut parts = act.into_iter();
    let (key, value) = unsafe {
        // UNSAFE(@spinel): This is completely safe as we've already checked
        // that there are at least 2 arguments
        (parts.next().unsafe_unwrap(), parts.next().unsafe_unwrap())
    };
    let now = coredb::time_now();
    let options = parse_options(parts, now)?;
    let outcome = {
        let mut table = handle.acquire_table();
        let (existed, prior) = match table.get(&key) {
            Some(record) => match record.get_value() {
                Value::Str(data) => (true, Some(data.get_blob().clone())),
                // the GET option cannot echo a list back
                Value::List(_) if options.get => {
                    return Err(ActionError::ActionError(responses::groups::WRONGTYPE_ERR))
                }
                Value::List(_) => (true, None),
            },
            None => (false, None),
        };
        let rejected = (options.nx && existed) || (options.xx && !existed);
        if rejected {
            match prior {
                Some(prior) if options.get => Outcome::Prior(prior),
                _ => Outcome::Nil,
            }
        } else {
            table.set(
                key,
                Record::new(Value::Str(value), options.expiry.unwrap_or(0)),
            );
            if options.get {
                match prior {
                    Some(prior) => Outcome::Prior(prior),
                    None => Outcome::Nil,
                }
            } else {
                Outcome::Okay
            }
        }
    };
    match outcome {
        Outcome::Okay => conwrite!(con, responses::groups::OKAY)?,
        Outcome::Prior(prior) => conwrite!(con, StringWrapper(Data::from_blob(prior)))?,
        Outcome::Nil => conwrite!(con, responses::groups::NIL)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<Data> {
        raw.iter()
            .map(|token| Data::from_string(token.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_options_flags() {
        let options = parse_options(tokens(&["NX", "GET"]).into_iter(), 0).unwrap();
        assert_eq!(
            options,
            SetOptions {
                nx: true,
                xx: false,
                get: true,
                expiry: None
            }
        );
    }

    #[test]
    fn test_parse_options_expiry_family() {
        let now = 5_000;
        let ex = parse_options(tokens(&["EX", "2"]).into_iter(), now).unwrap();
        assert_eq!(ex.expiry, Some(7_000));
        let px = parse_options(tokens(&["PX", "250"]).into_iter(), now).unwrap();
        assert_eq!(px.expiry, Some(5_250));
        let exat = parse_options(tokens(&["EXAT", "9"]).into_iter(), now).unwrap();
        assert_eq!(exat.expiry, Some(9_000));
        let pxat = parse_options(tokens(&["PXAT", "9000"]).into_iter(), now).unwrap();
        assert_eq!(pxat.expiry, Some(9_000));
    }

    #[test]
    fn test_parse_options_rejects_illegal_combinations() {
        let syntax_err = ActionError::ActionError(responses::groups::SYNTAX_ERR);
        assert_eq!(
            parse_options(tokens(&["NX", "XX"]).into_iter(), 0).unwrap_err(),
            syntax_err
        );
        assert_eq!(
            parse_options(tokens(&["EX", "1", "PX", "2"]).into_iter(), 0).unwrap_err(),
            syntax_err
        );
        // a trailing expiry option without its integer
        assert_eq!(
            parse_options(tokens(&["EX"]).into_iter(), 0).unwrap_err(),
            syntax_err
        );
        // option tokens are uppercase only
        assert_eq!(
            parse_options(tokens(&["nx"]).into_iter(), 0).unwrap_err(),
            syntax_err
        );
    }

    #[test]
    fn test_parse_options_rejects_non_numeric_expiry() {
        assert_eq!(
            parse_options(tokens(&["EX", "soon"]).into_iter(), 0).unwrap_err(),
            ActionError::ActionError(responses::groups::INTEGER_CONVERSION_ERR)
        );
    }
}
