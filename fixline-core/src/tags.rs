/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Well-known FIX tag numbers.
//!
//! Only the tags the connector itself reads or writes, plus the user
//! management fields used by the bundled demos, are listed here.

/// BeginString (8).
pub const BEGIN_STRING: u32 = 8;
/// BodyLength (9).
pub const BODY_LENGTH: u32 = 9;
/// CheckSum (10).
pub const CHECK_SUM: u32 = 10;
/// MsgSeqNum (34).
pub const MSG_SEQ_NUM: u32 = 34;
/// MsgType (35).
pub const MSG_TYPE: u32 = 35;
/// RefSeqNum (45).
pub const REF_SEQ_NUM: u32 = 45;
/// SenderCompID (49).
pub const SENDER_COMP_ID: u32 = 49;
/// SenderSubID (50).
pub const SENDER_SUB_ID: u32 = 50;
/// SendingTime (52).
pub const SENDING_TIME: u32 = 52;
/// TargetCompID (56).
pub const TARGET_COMP_ID: u32 = 56;
/// TargetSubID (57).
pub const TARGET_SUB_ID: u32 = 57;
/// Text (58).
pub const TEXT: u32 = 58;
/// EncryptMethod (98).
pub const ENCRYPT_METHOD: u32 = 98;
/// HeartBtInt (108).
pub const HEART_BT_INT: u32 = 108;
/// TestReqID (112).
pub const TEST_REQ_ID: u32 = 112;
/// ResetSeqNumFlag (141).
pub const RESET_SEQ_NUM_FLAG: u32 = 141;
/// SenderLocationID (142).
pub const SENDER_LOCATION_ID: u32 = 142;
/// TargetLocationID (143).
pub const TARGET_LOCATION_ID: u32 = 143;
/// RefTagID (371).
pub const REF_TAG_ID: u32 = 371;
/// RefMsgType (372).
pub const REF_MSG_TYPE: u32 = 372;
/// SessionRejectReason (373).
pub const SESSION_REJECT_REASON: u32 = 373;
/// Username (553).
pub const USERNAME: u32 = 553;
/// Password (554).
pub const PASSWORD: u32 = 554;
/// UserRequestID (923).
pub const USER_REQUEST_ID: u32 = 923;
/// UserRequestType (924).
pub const USER_REQUEST_TYPE: u32 = 924;
/// UserStatus (926).
pub const USER_STATUS: u32 = 926;
/// UserStatusText (927).
pub const USER_STATUS_TEXT: u32 = 927;

/// Standard header tags in the order they are written after MsgType.
pub const HEADER_ORDER: [u32; 8] = [
    SENDER_COMP_ID,
    TARGET_COMP_ID,
    SENDER_SUB_ID,
    TARGET_SUB_ID,
    SENDER_LOCATION_ID,
    TARGET_LOCATION_ID,
    MSG_SEQ_NUM,
    SENDING_TIME,
];

/// Returns true for tags the encoder writes itself (8, 9, 10, 35).
#[inline]
#[must_use]
pub const fn is_framing(tag: u32) -> bool {
    matches!(tag, BEGIN_STRING | BODY_LENGTH | CHECK_SUM | MSG_TYPE)
}

/// Returns true for standard header tags.
#[inline]
#[must_use]
pub fn is_header(tag: u32) -> bool {
    HEADER_ORDER.contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_tags() {
        assert!(is_framing(BEGIN_STRING));
        assert!(is_framing(MSG_TYPE));
        assert!(!is_framing(SENDER_COMP_ID));
    }

    #[test]
    fn test_header_tags() {
        assert!(is_header(MSG_SEQ_NUM));
        assert!(is_header(SENDING_TIME));
        assert!(!is_header(USERNAME));
    }
}
