/*!

This is the long-form manual for `ranked_pairs` and `tideman`.

## The method

Ranked pairs (also called the Tideman method) elects the candidate that
beats every other candidate once the strongest pairwise victories have been
locked in:

1. For every pair of candidates, count how many voters prefer one over the
   other. Each ballot is a full ranking, so every ballot contributes one
   preference to every pair.
2. Every pair with a strict majority in one direction becomes a directed
   victory. Exactly tied pairs are dropped.
3. Victories are locked into a graph from the strongest down. A victory
   whose addition would close a cycle is discarded permanently.
4. The winner is the candidate with no locked victory against them. The
   locked graph is acyclic, so such a candidate exists whenever the
   election is well formed.

Two equally strong victories are locked in the order the pairs were
extracted (increasing candidate indices), which makes the outcome of a given
ballot set deterministic.

## Interactive use

Pass the candidate names on the command line and the program will prompt
for each ballot, one rank at a time:

```text
$ tideman Alice Bob Charlie
Number of voters: 3
Rank 1: Alice
Rank 2: Bob
Rank 3: Charlie
...
Alice
```

A name that does not match a registered candidate aborts with `Invalid
vote.`, as does a candidate ranked twice on the same ballot.

## Input formats

When `--input` is used, the following formats are supported through
`--input-type`:

### `csv`

One ballot per row, the ranking left to right, one candidate name per cell.
The first row is skipped when it is a header (see `firstVoteRowIndex` in the
configuration).

### `msforms`

Results from Microsoft Forms or Google Forms when using the ranking widget.
The input file is expected to be in Excel (.xlsx) format, with the complete
ranking in a single cell as `;`-separated candidate names.

### `json`

A JSON array of ballots, each ballot an array of candidate names in
preference order:

```json
[["Alice", "Bob", "Charlie"], ["Charlie", "Alice", "Bob"]]
```

## Configuration

The `--config` flag accepts a JSON document naming the candidates, the
rules and the ballot sources:

```json
{
  "outputSettings": { "contestName": "Club president 2024" },
  "ballotFileSources": [
    { "provider": "csv", "filePath": "ballots.csv", "firstVoteRowIndex": "2" }
  ],
  "candidates": [
    { "name": "Alice" }, { "name": "Bob" }, { "name": "Charlie" }
  ],
  "rules": { "maxCandidates": 9 }
}
```

`maxCandidates` bounds the number of candidates; the tabulation refuses
larger elections before allocating anything. The reference bound is 9.

## Output

The winner's name is printed on standard output. With `--out`, a JSON
summary is also produced, reporting every pairwise contest in lock order
with its supporting counts and whether it was locked. With `--reference`,
the summary is compared against a stored expected summary and any
difference is an error.

*/
