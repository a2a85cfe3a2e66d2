//! Fixed-point helpers. Ratios are `i128` scaled by [`SCALAR`].

use crate::{AuctionParams, AuctionQuote, Error};

/// 1.0 in fixed point (9 decimals).
pub const SCALAR: i128 = 1_000_000_000;
/// 365 days.
pub const YEAR: u64 = 31_536_000;

pub fn mul_div(a: i128, b: i128, c: i128) -> Result<i128, Error> {
    if c == 0 {
        return Err(Error::DivisionByZero);
    }
    a.checked_mul(b)
        .ok_or(Error::Overflow)?
        .checked_div(c)
        .ok_or(Error::Overflow)
}

/// Principal plus simple interest accrued since `borrow_time`, plus the
/// outstanding opening fee.
pub fn nominal_debt(
    borrow_amount: i128,
    opening_fee: i128,
    interest_rate: i128,
    borrow_time: u64,
    now: u64,
) -> Result<i128, Error> {
    let elapsed = now.saturating_sub(borrow_time) as i128;
    let interest = mul_div(
        borrow_amount
            .checked_mul(interest_rate)
            .ok_or(Error::Overflow)?,
        elapsed,
        SCALAR * YEAR as i128,
    )?;
    borrow_amount
        .checked_add(interest)
        .and_then(|d| d.checked_add(opening_fee))
        .ok_or(Error::Overflow)
}

/// Converts an amount recorded under `from_multiplier` into today's credit
/// units. Debt is marked up whenever the multiplier has fallen.
pub fn rescale(amount: i128, from_multiplier: i128, to_multiplier: i128) -> Result<i128, Error> {
    mul_div(amount, from_multiplier, to_multiplier)
}

/// Largest principal `collateral` can back under the current multiplier.
pub fn max_debt_for_collateral(
    collateral: i128,
    max_debt_per_collateral_token: i128,
    multiplier: i128,
) -> Result<i128, Error> {
    mul_div(collateral, max_debt_per_collateral_token, multiplier)
}

/// Multiplier after spreading `loss` over `supply` credit units. Never
/// increases and never reaches zero.
pub fn marked_down_multiplier(multiplier: i128, supply: i128, loss: i128) -> Result<i128, Error> {
    if loss <= 0 {
        return Ok(multiplier);
    }
    if supply <= loss {
        return Ok(1);
    }
    Ok(mul_div(multiplier, supply - loss, supply)?.max(1))
}

/// Two-phase Dutch auction price at `elapsed` seconds after the auction start.
///
/// Phase 1 offers a growing share of the collateral for the full debt; phase 2
/// offers all of the collateral for a shrinking share of the debt.
pub fn auction_quote(
    params: &AuctionParams,
    elapsed: u64,
    collateral: i128,
    call_debt: i128,
) -> Result<AuctionQuote, Error> {
    if elapsed > params.auction_duration {
        return Err(Error::AuctionExpired);
    }
    let (collateral_to_bidder, credit_asked) = if elapsed <= params.mid_point {
        (
            mul_div(collateral, elapsed as i128, params.mid_point as i128)?,
            call_debt,
        )
    } else {
        let remaining = (params.auction_duration - elapsed) as i128;
        let phase_two = (params.auction_duration - params.mid_point) as i128;
        (collateral, mul_div(call_debt, remaining, phase_two)?)
    };
    Ok(AuctionQuote {
        collateral_to_bidder,
        collateral_to_borrower: collateral - collateral_to_bidder,
        credit_asked,
    })
}

pub fn validate_auction_params(params: &AuctionParams) -> Result<(), Error> {
    if params.mid_point == 0 || params.auction_duration <= params.mid_point {
        return Err(Error::InvalidConfig);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    const PARAMS: AuctionParams = AuctionParams {
        mid_point: 600,
        auction_duration: 1_800,
    };

    #[test]
    fn one_year_of_five_percent() {
        let debt = nominal_debt(1_000, 0, 50_000_000, 0, YEAR).unwrap();
        assert_eq!(debt, 1_050);
    }

    #[test]
    fn opening_fee_is_added_to_nominal_debt() {
        let debt = nominal_debt(1_000, 20, 50_000_000, 100, 100).unwrap();
        assert_eq!(debt, 1_020);
    }

    #[test]
    fn markdown_scales_debt_by_multiplier_ratio() {
        assert_eq!(rescale(1_000, SCALAR, SCALAR / 2).unwrap(), 2_000);
        assert_eq!(rescale(1_000, SCALAR, SCALAR).unwrap(), 1_000);
    }

    #[test]
    fn max_debt_at_par() {
        assert_eq!(
            max_debt_for_collateral(10, 1_000 * SCALAR, SCALAR).unwrap(),
            10_000
        );
    }

    #[test]
    fn schedule_bounds() {
        let start = auction_quote(&PARAMS, 0, 10, 1_050).unwrap();
        assert_eq!(start.collateral_to_bidder, 0);
        assert_eq!(start.collateral_to_borrower, 10);
        assert_eq!(start.credit_asked, 1_050);

        let mid = auction_quote(&PARAMS, 600, 10, 1_050).unwrap();
        assert_eq!(mid.collateral_to_bidder, 10);
        assert_eq!(mid.credit_asked, 1_050);

        let end = auction_quote(&PARAMS, 1_800, 10, 1_050).unwrap();
        assert_eq!(end.collateral_to_bidder, 10);
        assert_eq!(end.credit_asked, 0);

        assert_eq!(
            auction_quote(&PARAMS, 1_801, 10, 1_050),
            Err(Error::AuctionExpired)
        );
    }

    #[test]
    fn schedule_mid_phases() {
        let q = auction_quote(&PARAMS, 300, 10, 1_050).unwrap();
        assert_eq!((q.collateral_to_bidder, q.credit_asked), (5, 1_050));
        let q = auction_quote(&PARAMS, 1_200, 10, 1_050).unwrap();
        assert_eq!((q.collateral_to_bidder, q.credit_asked), (10, 525));
    }

    #[test]
    fn markdown_floors_at_one() {
        assert_eq!(marked_down_multiplier(SCALAR, 100, 100).unwrap(), 1);
        assert_eq!(marked_down_multiplier(SCALAR, 100, 0).unwrap(), SCALAR);
        assert_eq!(marked_down_multiplier(SCALAR, 1_000, 500).unwrap(), SCALAR / 2);
    }

    #[test]
    fn rejects_degenerate_params() {
        let bad = AuctionParams {
            mid_point: 600,
            auction_duration: 600,
        };
        assert_eq!(validate_auction_params(&bad), Err(Error::InvalidConfig));
        assert_eq!(validate_auction_params(&PARAMS), Ok(()));
    }

    proptest! {
        #[test]
        fn multiplier_never_increases(
            multiplier in 1i128..=SCALAR,
            supply in 0i128..1_000_000_000_000,
            loss in 0i128..1_000_000_000_000,
        ) {
            let next = marked_down_multiplier(multiplier, supply, loss).unwrap();
            prop_assert!(next <= multiplier);
            prop_assert!(next >= 1);
        }

        #[test]
        fn offered_collateral_grows_and_ask_shrinks(
            a in 0u64..=1_800,
            b in 0u64..=1_800,
            collateral in 1i128..1_000_000_000,
            debt in 1i128..1_000_000_000,
        ) {
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let q1 = auction_quote(&PARAMS, early, collateral, debt).unwrap();
            let q2 = auction_quote(&PARAMS, late, collateral, debt).unwrap();
            prop_assert!(q1.collateral_to_bidder <= q2.collateral_to_bidder);
            prop_assert!(q1.credit_asked >= q2.credit_asked);
            prop_assert!(q2.collateral_to_bidder <= collateral);
            prop_assert_eq!(q2.collateral_to_bidder + q2.collateral_to_borrower, collateral);
        }

        #[test]
        fn debt_is_non_decreasing_in_time(
            principal in 1i128..1_000_000_000_000,
            rate in 0i128..SCALAR,
            t1 in 0u64..(10 * YEAR),
            t2 in 0u64..(10 * YEAR),
        ) {
            let (early, late) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            let d1 = nominal_debt(principal, 0, rate, 0, early).unwrap();
            let d2 = nominal_debt(principal, 0, rate, 0, late).unwrap();
            prop_assert!(d1 <= d2);
            prop_assert!(d1 >= principal);
        }
    }
}
