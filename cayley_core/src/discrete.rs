use bnum::types::U512;

/// Calculate the GCD of two numbers
#[must_use]
pub fn gcd(mut a: U512, mut b: U512) -> U512 {
    loop {
        if b == U512::ZERO {
            return a;
        }

        let rem = a % b;
        a = b;
        b = rem;
    }
}

/// Calculate the LCM of two numbers
///
/// # Panics
///
/// Panics if either number is zero.
#[must_use]
pub fn lcm(a: U512, b: U512) -> U512 {
    assert!(a != U512::ZERO);
    assert!(b != U512::ZERO);

    b / gcd(a, b) * a
}

/// Calculate the LCM of a list of numbers
pub fn lcm_iter(values: impl Iterator<Item = U512>) -> U512 {
    values.fold(U512::ONE, lcm)
}

/// Calculate `n!`, the order of the symmetric group on `n` points
#[must_use]
pub fn factorial(n: usize) -> U512 {
    let mut acc = U512::ONE;

    for i in 2..=n {
        acc *= U512::from(i as u64);
    }

    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcm_and_gcd() {
        let lcm_int = |a: u64, b: u64| lcm(U512::from(a), U512::from(b));
        let gcd_int = |a: u64, b: u64| gcd(U512::from(a), U512::from(b));

        assert_eq!(gcd_int(3, 5), U512::from(1_u64));
        assert_eq!(gcd_int(3, 6), U512::from(3_u64));
        assert_eq!(gcd_int(4, 6), U512::from(2_u64));

        assert_eq!(lcm_int(3, 5), U512::from(15_u64));
        assert_eq!(lcm_int(3, 6), U512::from(6_u64));
        assert_eq!(lcm_int(4, 6), U512::from(12_u64));

        assert_eq!(
            lcm_iter([2_u64, 3, 4, 5].into_iter().map(U512::from)),
            U512::from(60_u64)
        );
    }

    #[test]
    fn factorials() {
        assert_eq!(factorial(0), U512::ONE);
        assert_eq!(factorial(1), U512::ONE);
        assert_eq!(factorial(5), U512::from(120_u64));
        assert_eq!(factorial(10), U512::from(3_628_800_u64));
        assert_eq!(
            factorial(20),
            "2432902008176640000".parse::<U512>().unwrap()
        );
    }
}
