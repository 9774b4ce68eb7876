/*!

This is the long-form manual for `signature_tally` and `sigtally`.

## What the program computes

Each input record is one *signature*: a voter endorsing a candidate for a
race. For every race, a voter may only cast a limited number of signatures
(the *cap*, 1 for most races). Signatures are processed in input order; once a
voter reaches the cap for a race, every further signature from that voter in
that race is counted as illegitimate and ignored.

After tabulation, the candidates of each race are compared against the race's
qualification threshold:

* `qualified`: candidates with at least `qualificationThreshold` accepted signatures
* `partial`: candidates with at least one accepted signature, below the threshold
* candidates without any accepted signature are not reported

## Input format

The expected input is the CSV export of the signature collection form. The
relevant columns are the position (race), the candidate, and the voter's
election id; the election id is upper-cased before tabulation so that the same
voter is not counted twice under different casings. The remaining columns of
the export (timestamp, email, attachment, city) are ignored.

The column positions and the number of header rows are set in the
configuration file, see `signatureFileSources`.

## Race policies

Race rules are not hardcoded: the configuration file carries a list of
substring rules plus a default, for example:

```text
"racePolicies": [
    { "contains": "Court", "maxSignaturesPerVoter": 7, "qualificationThreshold": 30 }
],
"defaultPolicy": { "maxSignaturesPerVoter": 1, "qualificationThreshold": 30 }
```

Any race whose name contains `Court` allows 7 signatures per voter; every
other race allows a single one. If the configuration file lists the races
explicitly (the `races` key), a record naming any other race aborts the run:
an incomplete configuration is an operator error, never silently defaulted.

## Output

The summary is a JSON document with, for every race, the legitimate and
illegitimate totals and the `qualified`/`partial` candidate lists, both sorted
by count (descending). Rows rejected during normalization are listed under
`issues` with their line numbers.

*/
