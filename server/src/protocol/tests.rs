/*
 * Created on Thu Mar 18 2021
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

use super::element::Element;
use super::ActionGroup;
use super::ParseError;
use super::Parser;
use crate::coredb::Data;

/// Serialise an element, decode it back and check that both the value and
/// the consumed count match
fn assert_round_trip(element: Element) {
    let encoded = element.serialise();
    let mut parser = Parser::complete(&encoded);
    let decoded = parser.parse_next_element().unwrap();
    assert_eq!(decoded, element);
    assert_eq!(parser.consumed(), encoded.len());
}

#[test]
fn test_round_trip_simple_string() {
    assert_round_trip(Element::SimpleString(Data::from_string("PONG".to_owned())));
    assert_round_trip(Element::SimpleString(Data::copy_from_slice(b"")));
}

#[test]
fn test_round_trip_simple_error() {
    assert_round_trip(Element::SimpleError(Data::from_string(
        "unknown command".to_owned(),
    )));
}

#[test]
fn test_round_trip_integer() {
    assert_round_trip(Element::Integer(0));
    assert_round_trip(Element::Integer(-42));
    assert_round_trip(Element::Integer(i64::MAX));
}

#[test]
fn test_round_trip_bulk_string() {
    assert_round_trip(Element::BulkString(Some(Data::from_string(
        "carbon".to_owned(),
    ))));
    // the null and the empty forms are distinct
    assert_round_trip(Element::BulkString(None));
    assert_round_trip(Element::BulkString(Some(Data::copy_from_slice(b""))));
}

#[test]
fn test_bulk_string_is_binary_safe() {
    assert_round_trip(Element::BulkString(Some(Data::copy_from_slice(
        b"\x00\x0d\x0a\xffbinary\r\n",
    ))));
}

#[test]
fn test_round_trip_array() {
    assert_round_trip(Element::Array(None));
    assert_round_trip(Element::Array(Some(Vec::new())));
    assert_round_trip(Element::Array(Some(vec![
        Element::Integer(1),
        Element::BulkString(Some(Data::from_string("two".to_owned()))),
        Element::Array(Some(vec![Element::SimpleString(Data::from_string(
            "three".to_owned(),
        ))])),
    ])));
}

#[test]
fn test_null_and_empty_encodings() {
    assert_eq!(Element::BulkString(None).serialise(), b"$-1\r\n");
    assert_eq!(
        Element::BulkString(Some(Data::copy_from_slice(b""))).serialise(),
        b"$0\r\n\r\n"
    );
    assert_eq!(Element::Array(None).serialise(), b"*-1\r\n");
    assert_eq!(Element::Array(Some(Vec::new())).serialise(), b"*0\r\n");
}

#[test]
fn test_wrong_decoder_is_rejected() {
    let bulk = Element::BulkString(Some(Data::from_string("foo".to_owned()))).serialise();
    assert_eq!(
        Parser::complete(&bulk).parse_next_simple_string().unwrap_err(),
        ParseError::InvalidDeserialiser
    );
    let simple = Element::SimpleString(Data::from_string("OK".to_owned())).serialise();
    assert_eq!(
        Parser::complete(&simple).parse_next_bulk_string().unwrap_err(),
        ParseError::InvalidDeserialiser
    );
    assert_eq!(
        Parser::complete(&simple).parse_next_bulk_array().unwrap_err(),
        ParseError::InvalidDeserialiser
    );
}

#[test]
fn test_truncation_is_always_an_error() {
    let frames = vec![
        Element::SimpleString(Data::from_string("OK".to_owned())),
        Element::SimpleError(Data::from_string("err".to_owned())),
        Element::Integer(1234),
        Element::BulkString(Some(Data::from_string("truncate me".to_owned()))),
        Element::Array(Some(vec![
            Element::BulkString(Some(Data::from_string("x".to_owned()))),
            Element::Integer(-1),
        ])),
    ];
    for frame in frames {
        let encoded = frame.serialise();
        for upto in 1..encoded.len() {
            let err = Parser::complete(&encoded[..upto])
                .parse_next_element()
                .unwrap_err();
            assert!(
                err == ParseError::TerminatorNotFound || err == ParseError::BulkStringDataSize,
                "unexpected error {:?} for {:?} cut at {}",
                err,
                frame,
                upto
            );
        }
    }
}

#[test]
fn test_bad_length_preambles() {
    assert_eq!(
        Parser::complete(b"$abc\r\nfoo\r\n")
            .parse_next_element()
            .unwrap_err(),
        ParseError::LengthExtraction
    );
    assert_eq!(
        Parser::complete(b"*-2\r\n").parse_next_element().unwrap_err(),
        ParseError::LengthExtraction
    );
    assert_eq!(
        Parser::complete(b":12a\r\n").parse_next_element().unwrap_err(),
        ParseError::IntegerConversion
    );
}

#[test]
fn test_unknown_identifier() {
    assert_eq!(
        Parser::complete(b"?5\r\nhello\r\n")
            .parse_next_element()
            .unwrap_err(),
        ParseError::UnidentifiedType
    );
}

#[test]
fn test_stray_linefeed_in_preamble() {
    assert_eq!(
        Parser::complete(b"+OK\nzz\r\n")
            .parse_next_element()
            .unwrap_err(),
        ParseError::TerminatorNotFound
    );
}

#[test]
fn test_parse_query() {
    let buf = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n";
    let (group, forward_by) = Parser::new(buf).parse_query().unwrap();
    assert_eq!(forward_by, buf.len());
    assert_eq!(
        group,
        ActionGroup::new(vec![
            Data::copy_from_slice(b"SET"),
            Data::copy_from_slice(b"k"),
            Data::copy_from_slice(b"v"),
        ])
    );
}

#[test]
fn test_parse_query_is_incremental() {
    // a partial request is not an error in streaming mode: the dispatcher
    // will read more data and try again
    let full = b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n";
    for upto in 1..full.len() {
        assert_eq!(
            Parser::new(&full[..upto]).parse_query().unwrap_err(),
            ParseError::NotEnough,
            "cut at {}",
            upto
        );
    }
    assert!(Parser::new(full).parse_query().is_ok());
}

#[test]
fn test_parse_query_leaves_the_next_request_alone() {
    let buf = b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nPING\r\n";
    let (_, forward_by) = Parser::new(buf).parse_query().unwrap();
    assert_eq!(forward_by, buf.len() / 2);
}

#[test]
fn test_parse_query_rejects_non_arrays() {
    assert_eq!(
        Parser::new(b"+PING\r\n").parse_query().unwrap_err(),
        ParseError::InvalidClientData
    );
    // the elements have to be bulk strings
    assert_eq!(
        Parser::new(b"*1\r\n:1\r\n").parse_query().unwrap_err(),
        ParseError::InvalidClientData
    );
    // and a request can't be empty or null
    assert_eq!(
        Parser::new(b"*0\r\n").parse_query().unwrap_err(),
        ParseError::InvalidClientData
    );
    assert_eq!(
        Parser::new(b"*-1\r\n").parse_query().unwrap_err(),
        ParseError::InvalidClientData
    );
}
