use cfg_if::cfg_if;

#[cfg_attr(feature = "force-soft", allow(dead_code))]
pub(crate) mod bitsliced;
pub(crate) mod soft;

cfg_if! {
    if #[cfg(feature = "force-soft")] {
        pub(crate) use soft::xor_first_bits;
    } else {
        pub(crate) use bitsliced::xor_first_bits;
    }
}
